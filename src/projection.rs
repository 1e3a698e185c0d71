//! Canonical projections and their digests.
//!
//! A projection is the fixed subset of a record's fields that define its
//! identity. It serializes as compact JSON with fields in declaration order,
//! so the digest never depends on key order in the input or on fields outside
//! the projection (scores, vote counts, fetch times).

use crate::error::Result;
use crate::json_utils::{bool_or_false, raw_or_null, str_or_empty};
use crate::tree::CommentRow;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Length of a hex digest.
pub const DIGEST_HEX_LEN: usize = 64;

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Something with a canonical serialization that can be digested.
pub trait Canonical {
    fn canonical_bytes(&self) -> Result<Vec<u8>>;

    fn digest(&self) -> Result<String> {
        Ok(sha256_hex(&self.canonical_bytes()?))
    }
}

impl<T: Serialize> Canonical for [T] {
    fn canonical_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Tracked fields of a submission. Field order is the serialization order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubmissionProjection {
    pub id: String,
    pub name: String,
    pub subreddit: String,
    pub author: String,
    pub is_self: bool,
    pub domain: String,
    pub title: String,
    pub selftext_html: String,
    pub selftext: String,
    pub url: String,
    pub permalink: String,
    pub edited: Value,
    pub over_18: bool,
    pub spoiler: bool,
    pub locked: bool,
    pub stickied: bool,
    pub link_flair_text: String,
    pub link_flair_css_class: String,
}

impl SubmissionProjection {
    pub fn from_value(v: &Value) -> Self {
        Self {
            id: str_or_empty(v, "id"),
            name: str_or_empty(v, "name"),
            subreddit: str_or_empty(v, "subreddit"),
            author: str_or_empty(v, "author"),
            is_self: bool_or_false(v, "is_self"),
            domain: str_or_empty(v, "domain"),
            title: str_or_empty(v, "title"),
            selftext_html: str_or_empty(v, "selftext_html"),
            selftext: str_or_empty(v, "selftext"),
            url: str_or_empty(v, "url"),
            permalink: str_or_empty(v, "permalink"),
            edited: raw_or_null(v, "edited"),
            over_18: bool_or_false(v, "over_18"),
            spoiler: bool_or_false(v, "spoiler"),
            locked: bool_or_false(v, "locked"),
            stickied: bool_or_false(v, "stickied"),
            link_flair_text: str_or_empty(v, "link_flair_text"),
            link_flair_css_class: str_or_empty(v, "link_flair_css_class"),
        }
    }
}

impl Canonical for SubmissionProjection {
    fn canonical_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Tracked fields of one comment. `created_utc` is part of the row but not of
/// its identity.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CommentProjection {
    pub id: String,
    pub parent_id: String,
    pub author: String,
    pub body: String,
    pub body_html: String,
    pub edited: Value,
    pub stickied: bool,
    pub distinguished: Value,
    pub is_submitter: bool,
    pub permalink: String,
}

impl CommentProjection {
    pub fn from_row(r: &CommentRow) -> Self {
        Self {
            id: r.id.clone(),
            parent_id: r.parent_id.clone(),
            author: r.author.clone(),
            body: r.body.clone(),
            body_html: r.body_html.clone(),
            edited: r.edited.clone(),
            stickied: r.stickied,
            distinguished: r.distinguished.clone(),
            is_submitter: r.is_submitter,
            permalink: r.permalink.clone(),
        }
    }
}

/// Digest of a raw submission record.
pub fn digest_submission(raw: &Value) -> Result<String> {
    SubmissionProjection::from_value(raw).digest()
}

/// Digest of a whole comment set, in the given (already flattened) order.
pub fn digest_comment_rows(rows: &[CommentRow]) -> Result<String> {
    let projected: Vec<CommentProjection> = rows.iter().map(CommentProjection::from_row).collect();
    projected.as_slice().digest()
}
