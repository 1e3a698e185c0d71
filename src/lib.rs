mod config;
mod date;
mod error;
mod paths;
mod util;

mod json_utils;
mod ndjson;
mod projection;
mod tree;

mod store;
mod source;
mod client;
mod walker;
mod progress;
mod pipeline;

pub use crate::config::{HarvestOptions, Credentials, clamp_page_size, DEFAULT_ROOT, DEFAULT_LOOKBACK_DAYS, MAX_PAGE_SIZE};
pub use crate::error::{HarvestError, Result};
pub use crate::pipeline::{Harvester, SubmissionCounts, CommentCounts, ThreadCandidate};

// Time helpers used in bucket and snapshot names.
pub use crate::date::{stamp, stamp_unix, parse_stamp, cutoff_unix};

// Storage layout.
pub use crate::paths::{
    bucket_name, comments_dir, comments_root, submission_dir, submissions_root, snapshot_file_name,
    SnapshotName, EMPTY_MARKER, EMPTY_MARKER_BODY,
};

// Projection + digest.
pub use crate::projection::{
    Canonical, SubmissionProjection, CommentProjection, digest_submission, digest_comment_rows, sha256_hex,
    DIGEST_HEX_LEN,
};

// Comment forest flattening.
pub use crate::tree::{CommentRow, Node, flatten, row_order};

// Dedup store.
pub use crate::store::{WriteOutcome, has_digest, write_once, write_once_at, write_empty_marker, snapshot_count};
pub use crate::ndjson::{read_first_line, read_lines};

// Collaborators and the Reddit transport.
pub use crate::source::{ListingFetcher, ThreadFetcher, CredentialProvider, ListingPage};
pub use crate::client::{RedditClient, OAuthGrant, thread_forest_from_slice};

// Pagination walker.
pub use crate::walker::{Walker, ListingItem, WalkSummary};

pub use crate::util::init_tracing_once;
