#![allow(dead_code)]

use rharvest::{thread_forest_from_slice, HarvestError, ListingFetcher, ListingPage, Node, ThreadFetcher};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Fixed "now" for every test: 2023-11-14T22:13:20Z.
pub const NOW: i64 = 1_700_000_000;
pub const DAY: i64 = 86_400;

pub fn now() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(NOW).unwrap()
}

pub fn at(secs: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(secs).unwrap()
}

/// A raw submission record with a few volatile fields thrown in.
pub fn submission(id: &str, created_utc: i64, title: &str, score: i64) -> Value {
    json!({
        "id": id,
        "name": format!("t3_{id}"),
        "subreddit": "rust",
        "author": "ferris",
        "is_self": true,
        "domain": "self.rust",
        "title": title,
        "selftext": "body text",
        "selftext_html": "<p>body text</p>",
        "url": format!("https://www.reddit.com/r/rust/comments/{id}/"),
        "permalink": format!("/r/rust/comments/{id}/"),
        "edited": false,
        "over_18": false,
        "spoiler": false,
        "locked": false,
        "stickied": false,
        "link_flair_text": null,
        "link_flair_css_class": null,
        "score": score,
        "ups": score,
        "num_comments": 3,
        "created_utc": created_utc as f64,
    })
}

/// A `t1` node. `replies` is a `Listing` node or `None` (encoded as `""`).
pub fn comment(id: &str, parent_id: &str, created_utc: f64, body: &str, replies: Option<Value>) -> Value {
    json!({
        "kind": "t1",
        "data": {
            "id": id,
            "name": format!("t1_{id}"),
            "parent_id": parent_id,
            "author": "someone",
            "body": body,
            "body_html": format!("<p>{body}</p>"),
            "edited": false,
            "stickied": false,
            "distinguished": null,
            "is_submitter": false,
            "permalink": format!("/r/rust/comments/x/_/{id}/"),
            "created_utc": created_utc,
            "score": 1,
            "replies": replies.unwrap_or_else(|| json!("")),
        }
    })
}

pub fn listing(children: Vec<Value>) -> Value {
    json!({ "kind": "Listing", "data": { "children": children, "after": null } })
}

pub fn more(ids: &[&str]) -> Value {
    json!({ "kind": "more", "data": { "count": ids.len(), "children": ids } })
}

/// Full thread response: `[submission listing, comment listing]`.
pub fn thread_body(post: &Value, comments: Vec<Value>) -> Value {
    json!([
        { "kind": "Listing", "data": { "children": [ { "kind": "t3", "data": post } ] } },
        listing(comments),
    ])
}

/// A single reply chain `c0 -> c1 -> ... -> c{depth-1}` under post p1.
pub fn reply_chain(depth: usize) -> Value {
    let mut node = comment(&format!("c{}", depth - 1), &format!("t1_c{}", depth.saturating_sub(2)), depth as f64, "leaf", None);
    for i in (0..depth - 1).rev() {
        let parent = if i == 0 { "t3_p1".to_string() } else { format!("t1_c{}", i - 1) };
        node = comment(&format!("c{i}"), &parent, i as f64, "reply", Some(listing(vec![node])));
    }
    node
}

pub fn forest(comments: Vec<Value>) -> Node {
    Node::from_value(&listing(comments))
}

/// Listing fake: serves pre-built pages in order and records the cursors asked for.
/// With `failing_at(n)` the n-th request (0-based) returns a transport error.
pub struct FakeListing {
    pub pages: Vec<Vec<Value>>,
    pub fail_at: Option<usize>,
    pub cursors: RefCell<Vec<Option<String>>>,
}

impl FakeListing {
    pub fn new(pages: Vec<Vec<Value>>) -> Self {
        Self { pages, fail_at: None, cursors: RefCell::new(Vec::new()) }
    }

    pub fn failing_at(mut self, request: usize) -> Self {
        self.fail_at = Some(request);
        self
    }

    pub fn calls(&self) -> usize {
        self.cursors.borrow().len()
    }
}

impl ListingFetcher for FakeListing {
    fn list_new(&self, _subject: &str, cursor: Option<&str>, _page_size: u32) -> rharvest::Result<ListingPage> {
        let idx = self.calls();
        self.cursors.borrow_mut().push(cursor.map(str::to_string));
        if self.fail_at == Some(idx) {
            return Err(HarvestError::Transport("new.json 503 text/html".into()));
        }
        let items = self
            .pages
            .get(idx)
            .map(|p| p.iter().map(|v| serde_json::value::to_raw_value(v).unwrap()).collect())
            .unwrap_or_default();
        Ok(ListingPage { items })
    }
}

/// Thread fake keyed by post id. Ids in `failing` return a transport error.
#[derive(Default)]
pub struct FakeThreads {
    pub bodies: HashMap<String, Value>,
    pub failing: HashSet<String>,
    pub fetched: RefCell<Vec<String>>,
}

impl FakeThreads {
    pub fn with(mut self, post_id: &str, body: Value) -> Self {
        self.bodies.insert(post_id.to_string(), body);
        self
    }

    pub fn failing(mut self, post_id: &str) -> Self {
        self.failing.insert(post_id.to_string());
        self
    }
}

impl ThreadFetcher for FakeThreads {
    fn list_thread(&self, thread_id: &str) -> rharvest::Result<Node> {
        self.fetched.borrow_mut().push(thread_id.to_string());
        if self.failing.contains(thread_id) {
            return Err(HarvestError::Transport(format!("{thread_id} 503 text/html")));
        }
        let body = self
            .bodies
            .get(thread_id)
            .ok_or_else(|| HarvestError::Transport(format!("{thread_id} 404")))?;
        thread_forest_from_slice(&serde_json::to_vec(body).unwrap())
    }
}

/// File names in a directory, sorted. Missing directory gives an empty list.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut v: Vec<String> = match fs::read_dir(dir) {
        Ok(rd) => rd.map(|e| e.unwrap().file_name().to_string_lossy().into_owned()).collect(),
        Err(_) => Vec::new(),
    };
    v.sort();
    v
}

/// Every file under `dir`, recursively.
pub fn all_files(dir: &Path) -> Vec<PathBuf> {
    let mut v: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .collect();
    v.sort();
    v
}
