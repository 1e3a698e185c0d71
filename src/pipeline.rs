use crate::config::HarvestOptions;
use crate::date::{cutoff_unix, stamp};
use crate::error::{HarvestError, Result};
use crate::json_utils::f64_or_zero;
use crate::ndjson::read_first_line;
use crate::paths::{comments_dir, discover_submission_snapshots, is_thread_id, submission_dir};
use crate::progress::ProgressScope;
use crate::projection::{digest_comment_rows, digest_submission};
use crate::source::{ListingFetcher, ThreadFetcher};
use crate::store::{has_digest, write_empty_marker, write_once_at, WriteOutcome};
use crate::tree::{flatten, CommentRow};
use crate::util::{init_tracing_once, short_hash};
use crate::walker::Walker;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct Harvester {
    pub(crate) opts: HarvestOptions,
}

/// Totals of a submissions run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionCounts {
    pub pages: u64,
    /// Items at or after the cutoff.
    pub seen: u64,
    pub written: u64,
    pub skipped: u64,
}

/// Totals of a comments run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CommentCounts {
    /// Candidate threads found in storage.
    pub scanned: u64,
    pub written: u64,
    pub skipped: u64,
    pub empty: u64,
    pub errors: u64,
}

/// The chosen snapshot for one thread during comment discovery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThreadCandidate {
    pub post_id: String,
    pub created_utc: i64,
    /// Submission bucket name, reused for the comment bucket.
    pub bucket: String,
    /// Stem of the chosen snapshot file (`{capture}_{digest}`).
    pub capture: String,
    pub path: PathBuf,
}

/// What happened to one thread.
enum ThreadOutcome {
    Written { lines: usize, hash: String },
    Skipped { hash: String },
    Empty,
}

impl Default for Harvester {
    fn default() -> Self {
        Self::new()
    }
}

impl Harvester {
    pub fn new() -> Self {
        Self { opts: HarvestOptions::default() }
    }

    pub fn from_options(opts: HarvestOptions) -> Self {
        Self { opts }
    }

    // -------- Builder methods --------
    pub fn root(mut self, root: impl AsRef<Path>) -> Self { self.opts = self.opts.with_root(root); self }
    pub fn subreddit(mut self, sub: impl AsRef<str>) -> Self { self.opts = self.opts.with_subreddit(sub); self }
    pub fn lookback_days(mut self, days: u32) -> Self { self.opts = self.opts.with_lookback_days(days); self }
    pub fn page_size(mut self, n: u32) -> Self { self.opts = self.opts.with_page_size(n); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn now(mut self, now: time::OffsetDateTime) -> Self { self.opts = self.opts.with_now(now); self }

    pub fn cutoff(&self) -> i64 {
        cutoff_unix(self.opts.now(), self.opts.lookback_days)
    }

    /// Walk the subject's newest listing back to the cutoff and store every
    /// submission whose tracked fields changed since its last capture.
    ///
    /// Any listing, parse or filesystem error aborts the run; files written
    /// before it stay valid.
    pub fn run_submissions<F: ListingFetcher>(&self, fetcher: &F) -> Result<SubmissionCounts> {
        init_tracing_once();
        let sub = self.opts.subject()?;
        let root = &self.opts.root;
        let cutoff = self.cutoff();
        let mut counts = SubmissionCounts::default();

        let walker = Walker::new(fetcher, sub, cutoff, self.opts.page_size);
        let summary = walker.walk(|item| {
            counts.seen += 1;
            let dir = submission_dir(root, sub, item.created_utc, &item.id);
            let hash = digest_submission(&item.value)?;

            if has_digest(&dir, &hash)?.is_some() {
                counts.skipped += 1;
                return Ok(false);
            }
            let capture = stamp(self.opts.now());
            match write_once_at(&dir, &capture, &hash, [item.raw.get()])? {
                WriteOutcome::Written(_) => {
                    counts.written += 1;
                    Ok(true)
                }
                WriteOutcome::Skipped(_) => {
                    counts.skipped += 1;
                    Ok(false)
                }
            }
        })?;
        counts.pages = summary.pages;

        info!(
            sub,
            days = self.opts.lookback_days,
            pages = counts.pages,
            seen = counts.seen,
            written = counts.written,
            skipped = counts.skipped,
            "submissions done"
        );
        Ok(counts)
    }

    /// One candidate per thread: its latest capture among snapshots created at
    /// or after the cutoff. Sorted by post id.
    pub fn discover_threads(&self) -> Result<Vec<ThreadCandidate>> {
        let sub = self.opts.subject()?;
        let cutoff = self.cutoff();
        let mut by_post: BTreeMap<String, ThreadCandidate> = BTreeMap::new();

        for snap in discover_submission_snapshots(&self.opts.root, sub) {
            let (id, created) = match read_submission_head(&snap.path) {
                Ok(v) => v,
                Err(e) => {
                    debug!(path = %snap.path.display(), error = %e, "unreadable submission snapshot");
                    continue;
                }
            };
            if created < cutoff {
                continue;
            }
            let newer = by_post.get(&id).map_or(true, |old| snap.stem > old.capture);
            if newer {
                by_post.insert(
                    id.clone(),
                    ThreadCandidate {
                        post_id: id,
                        created_utc: created,
                        bucket: snap.bucket,
                        capture: snap.stem,
                        path: snap.path,
                    },
                );
            }
        }
        Ok(by_post.into_values().collect())
    }

    /// Fetch, flatten and store the comment set of every discovered thread.
    ///
    /// A failure on one thread is logged and counted in `errors`; the run
    /// carries on with the next thread.
    pub fn run_comments<F: ThreadFetcher>(&self, fetcher: &F) -> Result<CommentCounts> {
        init_tracing_once();
        let sub = self.opts.subject()?;
        let threads = self.discover_threads()?;
        let mut counts = CommentCounts { scanned: threads.len() as u64, ..Default::default() };

        info!(sub, days = self.opts.lookback_days, posts = counts.scanned, "comments start");
        let pb = ProgressScope::count(self.opts.progress, format!("r/{sub} comments"), counts.scanned);

        for t in &threads {
            let dir = comments_dir(&self.opts.root, sub, &t.bucket);
            let res = self.harvest_thread(fetcher, &t.post_id, &dir);
            pb.suspend(|| match &res {
                Ok(ThreadOutcome::Written { lines, hash }) => {
                    info!(sub, post = %t.post_id, lines, hash = short_hash(hash), "write")
                }
                Ok(ThreadOutcome::Skipped { hash }) => {
                    info!(sub, post = %t.post_id, hash = short_hash(hash), "skip")
                }
                Ok(ThreadOutcome::Empty) => info!(sub, post = %t.post_id, "no_comments"),
                Err(e) => warn!(sub, post = %t.post_id, error = %e, "fetch_error"),
            });
            match res {
                Ok(ThreadOutcome::Written { .. }) => counts.written += 1,
                Ok(ThreadOutcome::Skipped { .. }) => counts.skipped += 1,
                Ok(ThreadOutcome::Empty) => counts.empty += 1,
                Err(_) => counts.errors += 1,
            }
            pb.inc_items(1);
        }
        pb.finish("done");

        info!(
            sub,
            posts_scanned = counts.scanned,
            write = counts.written,
            skip = counts.skipped,
            empty = counts.empty,
            errors = counts.errors,
            "comments done"
        );
        Ok(counts)
    }

    fn harvest_thread<F: ThreadFetcher>(&self, fetcher: &F, post_id: &str, dir: &Path) -> Result<ThreadOutcome> {
        if !is_thread_id(post_id) {
            return Err(HarvestError::parse(format!("bad thread id {post_id:?}")));
        }
        let forest = fetcher.list_thread(post_id)?;
        let rows = flatten(&forest);
        if rows.is_empty() {
            write_empty_marker(dir)?;
            return Ok(ThreadOutcome::Empty);
        }

        let hash = digest_comment_rows(&rows)?;
        if has_digest(dir, &hash)?.is_some() {
            return Ok(ThreadOutcome::Skipped { hash });
        }

        let lines = encode_rows(&rows)?;
        let capture = stamp(self.opts.now());
        match write_once_at(dir, &capture, &hash, &lines)? {
            WriteOutcome::Written(_) => Ok(ThreadOutcome::Written { lines: lines.len(), hash }),
            WriteOutcome::Skipped(_) => Ok(ThreadOutcome::Skipped { hash }),
        }
    }
}

fn encode_rows(rows: &[CommentRow]) -> Result<Vec<String>> {
    rows.iter().map(|r| serde_json::to_string(r).map_err(HarvestError::from)).collect()
}

/// `id` and `created_utc` from the first line of a submission snapshot.
fn read_submission_head(path: &Path) -> Result<(String, i64)> {
    let line = read_first_line(path)?;
    let v: Value = serde_json::from_str(line.trim())?;
    let id = v
        .get("id")
        .and_then(|x| x.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HarvestError::parse("snapshot has no id"))?;
    Ok((id.to_string(), f64_or_zero(&v, "created_utc") as i64))
}
