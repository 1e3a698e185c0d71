//! Blocking Reddit OAuth transport: token grant, subreddit `new` listing and
//! full comment threads.

use crate::config::Credentials;
use crate::error::{HarvestError, Result};
use crate::paths::is_thread_id;
use crate::source::{CredentialProvider, ListingFetcher, ListingPage, ThreadFetcher};
use crate::tree::Node;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const API_BASE: &str = "https://oauth.reddit.com";
const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const TIMEOUT: Duration = Duration::from_secs(30);
const MAX_BODY_BYTES: usize = 2 << 20;
const ERROR_SNIPPET_BYTES: usize = 1024;

pub struct RedditClient {
    http: Client,
    user_agent: String,
    token: Option<String>,
}

impl RedditClient {
    pub fn new(user_agent: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(TIMEOUT).build()?;
        Ok(Self { http, user_agent: user_agent.into(), token: None })
    }

    /// Attach the bearer token used for the rest of the run.
    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    /// Send `req` and return the trimmed body of a 2xx `application/json` response.
    fn send_json(&self, url: &str, req: RequestBuilder) -> Result<Vec<u8>> {
        let req = req.header(USER_AGENT, &self.user_agent).header(ACCEPT, "application/json");
        let resp = req.send()?;
        let status = resp.status();
        let ct = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = resp.bytes()?;

        if !status.is_success() || !ct.contains("application/json") {
            let end = body.len().min(ERROR_SNIPPET_BYTES);
            return Err(HarvestError::Transport(format!(
                "{} {} {} {:?}",
                url,
                status.as_u16(),
                ct,
                String::from_utf8_lossy(&body[..end])
            )));
        }
        if body.len() > MAX_BODY_BYTES {
            return Err(HarvestError::Transport(format!(
                "{url}: response body of {} bytes exceeds {MAX_BODY_BYTES}",
                body.len()
            )));
        }
        Ok(body.trim_ascii().to_vec())
    }

    fn authed_get(&self, url: &str) -> Result<RequestBuilder> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| HarvestError::Transport("no bearer token set".into()))?;
        Ok(self.http.get(url).bearer_auth(token))
    }

    /// Exchange client credentials for an access token.
    pub fn fetch_token(&self, creds: &Credentials) -> Result<String> {
        let mut form: Vec<(&str, &str)> = Vec::with_capacity(4);
        match creds.password_grant() {
            Some((user, pass)) => {
                form.push(("grant_type", "password"));
                form.push(("username", user));
                form.push(("password", pass));
            }
            None => form.push(("grant_type", "client_credentials")),
        }
        form.push(("scope", "read"));

        let req = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&creds.client_id, Some(&creds.client_secret))
            .form(&form);
        let body = self.send_json(TOKEN_URL, req)?;

        #[derive(Deserialize)]
        struct TokenResponse {
            #[serde(default)]
            access_token: String,
        }
        let tr: TokenResponse = serde_json::from_slice(&body)?;
        if tr.access_token.is_empty() {
            return Err(HarvestError::Transport("empty access_token".into()));
        }
        Ok(tr.access_token)
    }
}

impl ListingFetcher for RedditClient {
    fn list_new(&self, subject: &str, cursor: Option<&str>, page_size: u32) -> Result<ListingPage> {
        let url = format!("{API_BASE}/r/{subject}/new.json");
        let limit = page_size.to_string();
        let mut query: Vec<(&str, &str)> = vec![("limit", limit.as_str()), ("raw_json", "1")];
        if let Some(after) = cursor.filter(|c| !c.is_empty()) {
            query.push(("after", after));
        }
        let body = self.send_json(&url, self.authed_get(&url)?.query(&query))?;
        ListingPage::from_slice(&body)
    }
}

impl ThreadFetcher for RedditClient {
    fn list_thread(&self, thread_id: &str) -> Result<Node> {
        if !is_thread_id(thread_id) {
            return Err(HarvestError::parse(format!("bad thread id {thread_id:?}")));
        }
        let url = format!("{API_BASE}/comments/{thread_id}.json");
        let query = [("depth", "1000"), ("limit", "500"), ("raw_json", "1"), ("sort", "confidence")];
        let body = self.send_json(&url, self.authed_get(&url)?.query(&query))?;
        thread_forest_from_slice(&body)
    }
}

/// Decode a thread response: `[submission listing, comment listing]`.
///
/// Every reply level nests five JSON levels, so serde_json's default recursion
/// limit would reject ordinary deep threads. The limit is lifted and the stack
/// grows on the heap instead.
pub fn thread_forest_from_slice(body: &[u8]) -> Result<Node> {
    let mut de = serde_json::Deserializer::from_slice(body);
    de.disable_recursion_limit();
    let v = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    match v.as_array() {
        Some(arr) if arr.len() >= 2 => Ok(Node::from_value(&arr[1])),
        _ => Err(HarvestError::parse("unexpected comments payload")),
    }
}

/// Token provider that performs the OAuth grant through a client.
pub struct OAuthGrant<'a> {
    pub client: &'a RedditClient,
    pub creds: &'a Credentials,
}

impl CredentialProvider for OAuthGrant<'_> {
    fn bearer_token(&self) -> Result<String> {
        self.client.fetch_token(self.creds)
    }
}

