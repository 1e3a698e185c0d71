//! On-disk layout:
//!
//! ```text
//! root/r_{sub}/submissions/{YYMMDDHHMMSS(created)}_{id}/{capture}_{digest}.jsonl
//! root/r_{sub}/comments/{YYMMDDHHMMSS(created)}_{id}/{capture}_{digest}.jsonl
//! ```

use crate::date::{stamp_unix, STAMP_LEN};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

pub const SNAPSHOT_EXT: &str = "jsonl";

/// Sentinel written into a comment bucket when the thread had no comments.
pub const EMPTY_MARKER: &str = "EMPTY.txt";
pub const EMPTY_MARKER_BODY: &str = "no_comments";

pub fn subject_tag(sub: &str) -> String {
    format!("r_{sub}")
}

pub fn subject_dir(root: &Path, sub: &str) -> PathBuf {
    root.join(subject_tag(sub))
}

pub fn submissions_root(root: &Path, sub: &str) -> PathBuf {
    subject_dir(root, sub).join("submissions")
}

pub fn comments_root(root: &Path, sub: &str) -> PathBuf {
    subject_dir(root, sub).join("comments")
}

/// Reddit ids are lowercase base36. Anything else never reaches a URL or a path.
pub fn is_thread_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}

/// Deterministic bucket name for an entity: `{YYMMDDHHMMSS(created)}_{id}`.
pub fn bucket_name(created_utc: i64, id: &str) -> String {
    format!("{}_{}", stamp_unix(created_utc), id)
}

pub fn submission_dir(root: &Path, sub: &str, created_utc: i64, id: &str) -> PathBuf {
    submissions_root(root, sub).join(bucket_name(created_utc, id))
}

/// Comment history lives under the same bucket name as its submission.
pub fn comments_dir(root: &Path, sub: &str, bucket: &str) -> PathBuf {
    comments_root(root, sub).join(bucket)
}

pub fn snapshot_file_name(capture: &str, digest: &str) -> String {
    format!("{capture}_{digest}.{SNAPSHOT_EXT}")
}

/// A parsed `{capture}_{digest}.jsonl` file name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotName {
    pub capture: String,
    pub digest: String,
}

/// `None` only if the pattern failed to build, in which case nothing parses.
fn snapshot_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"^(\d{{{STAMP_LEN}}})_([0-9a-f]{{64}})\.{SNAPSHOT_EXT}$")).ok())
        .as_ref()
}

impl SnapshotName {
    pub fn parse(file_name: &str) -> Option<Self> {
        let caps = snapshot_re()?.captures(file_name)?;
        Some(Self { capture: caps[1].to_string(), digest: caps[2].to_string() })
    }

    /// File stem used for "latest capture" comparisons.
    pub fn stem(&self) -> String {
        format!("{}_{}", self.capture, self.digest)
    }
}

/// One stored submission snapshot found under `submissions/`.
#[derive(Clone, Debug)]
pub struct SnapshotFile {
    pub path: PathBuf,
    /// Name of the bucket directory holding the file.
    pub bucket: String,
    /// File name without the `.jsonl` extension.
    pub stem: String,
}

/// All `submissions/*/{capture}_{digest}.jsonl` files for a subject, sorted by path.
/// A missing directory yields an empty list.
pub fn discover_submission_snapshots(root: &Path, sub: &str) -> Vec<SnapshotFile> {
    let dir = submissions_root(root, sub);
    let mut out = Vec::new();
    if !dir.exists() {
        return out;
    }
    for ent in WalkDir::new(&dir).min_depth(2).max_depth(2).into_iter().flatten() {
        if !ent.file_type().is_file() {
            continue;
        }
        let path = ent.path();
        // Only canonical snapshot names; temp files and stray files are ignored.
        let Some(snap) = path.file_name().and_then(|n| n.to_str()).and_then(SnapshotName::parse) else {
            continue;
        };
        let Some(bucket) = path.parent().and_then(|p| p.file_name()).and_then(|n| n.to_str()) else {
            continue;
        };
        out.push(SnapshotFile { path: path.to_path_buf(), bucket: bucket.to_string(), stem: snap.stem() });
    }
    out.sort_by(|a, b| a.path.cmp(&b.path));
    out
}
