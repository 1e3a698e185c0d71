#[path = "common/mod.rs"]
mod common;

use common::*;
use rharvest::{
    bucket_name, comments_dir, read_lines, snapshot_count, stamp_unix, submission_dir, write_once_at, CommentRow,
    Harvester, CommentCounts, EMPTY_MARKER,
};
use std::fs;
use std::path::Path;

fn harvester(root: &Path) -> Harvester {
    Harvester::new().root(root).subreddit("rust").lookback_days(7).progress(false).now(now())
}

/// Store submissions p1 (3 comments) and p2 (no comments) via a real submissions run.
fn seed(root: &Path) -> (serde_json::Value, serde_json::Value) {
    let p1 = submission("p1", NOW - 600, "with comments", 5);
    let p2 = submission("p2", NOW - 1_200, "quiet", 1);
    let fake = FakeListing::new(vec![vec![p1.clone(), p2.clone()]]);
    harvester(root).run_submissions(&fake).unwrap();
    (p1, p2)
}

fn p1_comments(second_body: &str) -> Vec<serde_json::Value> {
    vec![
        comment(
            "c1",
            "t3_p1",
            (NOW - 500) as f64,
            "first!",
            Some(listing(vec![comment("c2", "t1_c1", (NOW - 400) as f64, second_body, None)])),
        ),
        comment("c3", "t3_p1", (NOW - 450) as f64, "another top", None),
        more(&["c4"]),
    ]
}

fn p1_dir(root: &Path) -> std::path::PathBuf {
    comments_dir(root, "rust", &bucket_name(NOW - 600, "p1"))
}

/// Demonstrates a comments run over harvested submissions:
/// - p1 has three comments (plus a `more` placeholder), p2 has none.
/// Outcome: p1 gets one snapshot with its rows in canonical order; p2 gets only
/// the sentinel marker; counters report scanned=2 written=1 empty=1.
#[test]
fn run_comments_writes_snapshot_and_empty_marker() {
    let tmp = tempfile::tempdir().unwrap();
    let (p1, p2) = seed(tmp.path());
    let threads = FakeThreads::default()
        .with("p1", thread_body(&p1, p1_comments("reply")))
        .with("p2", thread_body(&p2, vec![]));

    let counts = harvester(tmp.path()).run_comments(&threads).unwrap();
    assert_eq!(counts, CommentCounts { scanned: 2, written: 1, skipped: 0, empty: 1, errors: 0 });
    assert_eq!(*threads.fetched.borrow(), vec!["p1".to_string(), "p2".to_string()]);

    let dir = p1_dir(tmp.path());
    assert_eq!(snapshot_count(&dir).unwrap(), 1);
    let names = file_names(&dir);
    let rows: Vec<CommentRow> = read_lines(&dir.join(&names[0]))
        .unwrap()
        .iter()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    // t1_c1 sorts before t3_p1; c1 precedes c3 by creation time.
    assert_eq!(ids, vec!["c2", "c1", "c3"]);
    assert_eq!(rows[0].body, "reply");

    let empty_dir = comments_dir(tmp.path(), "rust", &bucket_name(NOW - 1_200, "p2"));
    assert_eq!(file_names(&empty_dir), vec![EMPTY_MARKER.to_string()]);
}

/// Demonstrates idempotence and change detection across runs:
/// - rerun against the unchanged thread, then with an untracked score bump,
///   then with an edited reply body.
/// Outcome: the first two reruns skip with no new files; the edit writes a
/// second snapshot and keeps the first.
#[test]
fn rerun_skips_unchanged_and_captures_edits() {
    let tmp = tempfile::tempdir().unwrap();
    let (p1, _) = seed(tmp.path());
    let dir = p1_dir(tmp.path());

    let run = |body: serde_json::Value, at_secs: i64| {
        let threads = FakeThreads::default().with("p1", body).failing("p2");
        harvester(tmp.path()).now(at(at_secs)).run_comments(&threads).unwrap()
    };

    let c = run(thread_body(&p1, p1_comments("reply")), NOW);
    assert_eq!(c.written, 1);

    let c = run(thread_body(&p1, p1_comments("reply")), NOW + 3_600);
    assert_eq!((c.written, c.skipped), (0, 1));
    assert_eq!(snapshot_count(&dir).unwrap(), 1);

    let mut bumped = p1_comments("reply");
    bumped[1]["data"]["score"] = serde_json::json!(777);
    let c = run(thread_body(&p1, bumped), NOW + 7_200);
    assert_eq!((c.written, c.skipped), (0, 1));
    assert_eq!(snapshot_count(&dir).unwrap(), 1);

    let c = run(thread_body(&p1, p1_comments("reply, edited")), NOW + 10_800);
    assert_eq!(c.written, 1);
    let names = file_names(&dir);
    assert_eq!(names.len(), 2);
    assert!(names[0].starts_with(&stamp_unix(NOW)));
    assert!(names[1].starts_with(&stamp_unix(NOW + 10_800)));
}

/// Demonstrates per-thread failure isolation:
/// - p1's fetch fails, p2 succeeds.
/// Outcome: the run completes with errors=1 and p2 still gets processed.
#[test]
fn fetch_failure_is_isolated() {
    let tmp = tempfile::tempdir().unwrap();
    let (_, p2) = seed(tmp.path());
    let threads = FakeThreads::default()
        .failing("p1")
        .with("p2", thread_body(&p2, vec![comment("z", "t3_p2", 1.0, "hi", None)]));

    let counts = harvester(tmp.path()).run_comments(&threads).unwrap();
    assert_eq!(counts.errors, 1);
    assert_eq!(counts.written, 1);
    assert!(file_names(&p1_dir(tmp.path())).is_empty());
}

/// Demonstrates discovery:
/// - p1 captured twice (the later capture should win), p_old outside the
///   window, and a malformed snapshot file.
/// Outcome: one candidate per in-window post, carrying the latest capture stem.
#[test]
fn discovery_picks_latest_capture_within_window() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();

    let p1 = submission("p1", NOW - 600, "v1", 1);
    let p1b = submission("p1", NOW - 600, "v2", 1);
    let old = submission("p_old", NOW - 8 * DAY, "old", 1);
    let p1_dir = submission_dir(root, "rust", NOW - 600, "p1");
    let h1 = rharvest::digest_submission(&p1).unwrap();
    let h2 = rharvest::digest_submission(&p1b).unwrap();
    write_once_at(&p1_dir, "231101000000", &h1, [p1.to_string()]).unwrap();
    write_once_at(&p1_dir, "231105000000", &h2, [p1b.to_string()]).unwrap();
    let old_dir = submission_dir(root, "rust", NOW - 8 * DAY, "p_old");
    write_once_at(&old_dir, "231101000000", &rharvest::sha256_hex(b"o"), [old.to_string()]).unwrap();
    let junk_dir = root.join("r_rust").join("submissions").join("junk");
    write_once_at(&junk_dir, "231101000000", &rharvest::sha256_hex(b"j"), ["not json"]).unwrap();

    let found = harvester(root).discover_threads().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].post_id, "p1");
    assert_eq!(found[0].bucket, bucket_name(NOW - 600, "p1"));
    assert_eq!(found[0].capture, format!("231105000000_{h2}"));
    assert_eq!(found[0].created_utc, NOW - 600);
}

/// Demonstrates that a comments run over an empty storage root is a no-op.
/// Outcome: all counters are zero and nothing is fetched.
#[test]
fn run_comments_without_submissions() {
    let tmp = tempfile::tempdir().unwrap();
    let threads = FakeThreads::default();
    let counts = harvester(tmp.path()).run_comments(&threads).unwrap();
    assert_eq!(counts, CommentCounts::default());
    assert!(threads.fetched.borrow().is_empty());
}

/// Demonstrates isolation of storage failures:
/// - a plain file sits where p1's comment bucket should be; p2 has one comment.
/// Outcome: p1 counts as an error, p2 is still written.
#[test]
fn unwritable_bucket_is_isolated() {
    let tmp = tempfile::tempdir().unwrap();
    let (p1, p2) = seed(tmp.path());
    let blocked = p1_dir(tmp.path());
    fs::create_dir_all(blocked.parent().unwrap()).unwrap();
    fs::write(&blocked, "").unwrap();
    let threads = FakeThreads::default()
        .with("p1", thread_body(&p1, p1_comments("reply")))
        .with("p2", thread_body(&p2, vec![comment("z", "t3_p2", 1.0, "hi", None)]));

    let counts = harvester(tmp.path()).run_comments(&threads).unwrap();
    assert_eq!(counts, CommentCounts { scanned: 2, written: 1, skipped: 0, empty: 0, errors: 1 });
    assert!(blocked.is_file());
}

/// Demonstrates that a stored post id outside Reddit's base36 alphabet is
/// rejected before any fetch.
/// Outcome: the thread counts as an error, the fetcher is never called and no
/// comment bucket is created.
#[test]
fn malformed_post_id_is_never_fetched() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let evil = submission("../p1", NOW - 60, "t", 1);
    let dir = submission_dir(root, "rust", NOW - 60, "evil");
    write_once_at(&dir, "231114221320", &rharvest::digest_submission(&evil).unwrap(), [evil.to_string()]).unwrap();

    let threads = FakeThreads::default();
    let counts = harvester(root).run_comments(&threads).unwrap();
    assert_eq!((counts.scanned, counts.errors), (1, 1));
    assert!(threads.fetched.borrow().is_empty());
    assert!(!root.join("r_rust").join("comments").exists());
}
