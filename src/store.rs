//! Content-addressed, append-only snapshot store.
//!
//! A bucket directory holds every captured version of one entity as
//! `{capture}_{digest}.jsonl`. Files are created exactly once and never
//! rewritten; older digests stay on disk as history.

use crate::date::stamp;
use crate::error::{HarvestError, Result};
use crate::ndjson::NdjsonWriter;
use crate::paths::{snapshot_file_name, EMPTY_MARKER, EMPTY_MARKER_BODY, SNAPSHOT_EXT};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Result of a write attempt that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    /// The exact file name already existed: this content was already captured.
    Skipped(PathBuf),
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written(_))
    }

    pub fn path(&self) -> &Path {
        match self {
            WriteOutcome::Written(p) | WriteOutcome::Skipped(p) => p,
        }
    }
}

/// Latest snapshot in `dir` whose name ends in `_{digest}.jsonl`.
///
/// A missing directory is simply "not present". When several captures carry
/// the same digest the lexicographically greatest name wins.
pub fn has_digest(dir: &Path, digest: &str) -> Result<Option<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(HarvestError::fs(dir, e)),
    };
    let suffix = format!("_{digest}.{SNAPSHOT_EXT}");
    let mut best: Option<String> = None;
    for ent in entries {
        let ent = ent.map_err(|e| HarvestError::fs(dir, e))?;
        let is_file = ent.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        let Ok(name) = ent.file_name().into_string() else { continue };
        if name.starts_with('.') || !name.ends_with(&suffix) {
            continue;
        }
        if best.as_deref().map_or(true, |b| name.as_str() > b) {
            best = Some(name);
        }
    }
    Ok(best.map(|n| dir.join(n)))
}

/// Write `lines` as a new snapshot stamped with the current UTC time.
pub fn write_once<I, S>(dir: &Path, digest: &str, lines: I) -> Result<WriteOutcome>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    write_once_at(dir, &stamp(OffsetDateTime::now_utc()), digest, lines)
}

/// Write `lines` as `{capture}_{digest}.jsonl` in `dir`, creating `dir` if needed.
///
/// The name is claimed with exclusive-create semantics; losing that race (or a
/// second call within the same capture second) yields [`WriteOutcome::Skipped`].
pub fn write_once_at<I, S>(dir: &Path, capture: &str, digest: &str, lines: I) -> Result<WriteOutcome>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fs::create_dir_all(dir).map_err(|e| HarvestError::dir(dir, e))?;
    let out = dir.join(snapshot_file_name(capture, digest));
    if out.exists() {
        return Ok(WriteOutcome::Skipped(out));
    }
    publish_lines(out, lines)
}

/// Stage `lines` in a temp file and claim `out`. A name taken by then is a skip.
fn publish_lines<I, S>(out: PathBuf, lines: I) -> Result<WriteOutcome>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut w = NdjsonWriter::create_for(&out)?;
    for line in lines {
        w.write_line(line.as_ref())?;
    }
    match w.publish(&out) {
        Ok(()) => Ok(WriteOutcome::Written(out)),
        Err(e) if e.is_already_exists() => Ok(WriteOutcome::Skipped(out)),
        Err(e) => Err(e),
    }
}

/// Record "fetched, confirmed empty" in `dir`. An existing marker is left as is.
pub fn write_empty_marker(dir: &Path) -> Result<WriteOutcome> {
    fs::create_dir_all(dir).map_err(|e| HarvestError::dir(dir, e))?;
    let path = dir.join(EMPTY_MARKER);
    let created = OpenOptions::new().write(true).create_new(true).open(&path);
    match created {
        Ok(mut f) => {
            f.write_all(EMPTY_MARKER_BODY.as_bytes()).map_err(|e| HarvestError::fs(&path, e))?;
            Ok(WriteOutcome::Written(path))
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(WriteOutcome::Skipped(path)),
        Err(e) => Err(HarvestError::fs(&path, e)),
    }
}

/// Count of canonical snapshot files in a bucket (markers and temp files excluded).
pub fn snapshot_count(dir: &Path) -> Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(HarvestError::fs(dir, e)),
    };
    let mut n = 0;
    for ent in entries {
        let ent = ent.map_err(|e| HarvestError::fs(dir, e))?;
        let name = ent.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with('.') && name.ends_with(".jsonl") {
            n += 1;
        }
    }
    Ok(n)
}
