//! Comment forests: decoding Reddit's kind-tagged reply tree and flattening it
//! into a deterministically ordered list of rows.

use crate::json_utils::{bool_or_false, f64_or_zero, raw_or_null, str_or_empty};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Normalized comment, one per line in a comment snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommentRow {
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
    pub created_utc: f64,
}

impl CommentRow {
    pub fn from_value(v: &Value) -> Self {
        Self {
            id: str_or_empty(v, "id"),
            parent_id: str_or_empty(v, "parent_id"),
            author: str_or_empty(v, "author"),
            body: str_or_empty(v, "body"),
            body_html: str_or_empty(v, "body_html"),
            edited: raw_or_null(v, "edited"),
            stickied: bool_or_false(v, "stickied"),
            distinguished: raw_or_null(v, "distinguished"),
            is_submitter: bool_or_false(v, "is_submitter"),
            permalink: str_or_empty(v, "permalink"),
            created_utc: f64_or_zero(v, "created_utc"),
        }
    }
}

/// One node of a comment forest.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// `t1`: a comment and, optionally, the container of its replies.
    Comment { row: CommentRow, replies: Option<Box<Node>> },
    /// `Listing`: ordered children.
    Container(Vec<Node>),
    /// `more` (or anything unrecognized): replies exist but were not fetched.
    Elided,
}

impl Node {
    /// Decode a kind-tagged JSON node. Never fails; malformed parts decode as
    /// [`Node::Elided`] or as "no replies".
    pub fn from_value(v: &Value) -> Node {
        let kind = v.get("kind").and_then(|k| k.as_str()).unwrap_or_default();
        let Some(data) = v.get("data").filter(|d| d.is_object()) else {
            return Node::Elided;
        };
        match kind {
            "t1" => {
                // Reddit sends `"replies": ""` for a leaf comment.
                let replies = data
                    .get("replies")
                    .filter(|r| r.is_object())
                    .map(|r| Box::new(Node::from_value(r)));
                Node::Comment { row: CommentRow::from_value(data), replies }
            }
            "Listing" => Node::Container(decode_children(data)),
            _ => Node::Elided,
        }
    }
}

fn decode_children(data: &Value) -> Vec<Node> {
    data.get("children")
        .and_then(|c| c.as_array())
        .map(|arr| arr.iter().map(Node::from_value).collect())
        .unwrap_or_default()
}

/// Pre-order flatten: a comment, then its replies, then its next sibling.
/// Elided nodes are dropped.
fn walk(node: &Node, out: &mut Vec<CommentRow>) {
    match node {
        Node::Comment { row, replies } => {
            out.push(row.clone());
            if let Some(rep) = replies {
                walk(rep, out);
            }
        }
        Node::Container(children) => {
            for ch in children {
                walk(ch, out);
            }
        }
        Node::Elided => {}
    }
}

/// Total order on rows: parent_id, then created_utc, then id.
pub fn row_order(a: &CommentRow, b: &CommentRow) -> Ordering {
    a.parent_id
        .cmp(&b.parent_id)
        .then_with(|| a.created_utc.total_cmp(&b.created_utc))
        .then_with(|| a.id.cmp(&b.id))
}

/// Flatten a forest and sort it into its canonical order.
pub fn flatten(forest: &Node) -> Vec<CommentRow> {
    let mut rows = Vec::new();
    walk(forest, &mut rows);
    rows.sort_by(row_order);
    rows
}
