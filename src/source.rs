//! Collaborator seams: where listings, threads and tokens come from.

use crate::error::Result;
use crate::tree::Node;
use serde::Deserialize;
use serde_json::value::RawValue;

/// One listing page, newest first.
#[derive(Debug, Default)]
pub struct ListingPage {
    /// Raw records exactly as the API sent them.
    pub items: Vec<Box<RawValue>>,
}

#[derive(Deserialize)]
struct ListingEnvelope {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Deserialize)]
struct ListingChild {
    data: Box<RawValue>,
}

impl ListingPage {
    /// Decode a `{"data":{"children":[{"data":{..}}]}}` body.
    ///
    /// The API's own `after` token is ignored: the walker pages by the fullname
    /// of the last item it emitted.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let env: ListingEnvelope = serde_json::from_slice(body)?;
        Ok(Self { items: env.data.children.into_iter().map(|c| c.data).collect() })
    }
}

/// Paginated "newest submissions" listing for a subject.
pub trait ListingFetcher {
    fn list_new(&self, subject: &str, cursor: Option<&str>, page_size: u32) -> Result<ListingPage>;
}

/// Full comment forest of one thread.
pub trait ThreadFetcher {
    fn list_thread(&self, thread_id: &str) -> Result<Node>;
}

/// Supplies a bearer token for the lifetime of a run.
pub trait CredentialProvider {
    fn bearer_token(&self) -> Result<String>;
}

impl<T: ListingFetcher + ?Sized> ListingFetcher for &T {
    fn list_new(&self, subject: &str, cursor: Option<&str>, page_size: u32) -> Result<ListingPage> {
        (**self).list_new(subject, cursor, page_size)
    }
}

impl<T: ThreadFetcher + ?Sized> ThreadFetcher for &T {
    fn list_thread(&self, thread_id: &str) -> Result<Node> {
        (**self).list_thread(thread_id)
    }
}
