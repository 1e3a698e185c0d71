use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarvestError>;

/// Failure taxonomy shared by the walker, the store and the orchestrator.
///
/// Whether a variant is fatal depends on the stage that raised it: listing-stage
/// failures abort a run, per-thread failures are counted and skipped.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Network failure, non-success status or non-JSON response.
    #[error("transport error: {0}")]
    Transport(String),

    /// Missing or malformed required field.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Exclusive create hit an existing name. The store turns this into a skip.
    #[error("already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("invalid subreddit name: {0:?}")]
    InvalidSubject(String),
}

impl HarvestError {
    pub fn fs(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::AlreadyExists {
            return HarvestError::AlreadyExists(path.to_path_buf());
        }
        HarvestError::Filesystem { path: path.to_path_buf(), source }
    }

    /// Like [`HarvestError::fs`] but never a collision: `create_dir_all` reports
    /// `AlreadyExists` when a file sits where a directory should be.
    pub fn dir(path: &Path, source: io::Error) -> Self {
        HarvestError::Filesystem { path: path.to_path_buf(), source }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        HarvestError::Parse(msg.into())
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, HarvestError::AlreadyExists(_))
    }
}

impl From<reqwest::Error> for HarvestError {
    fn from(err: reqwest::Error) -> Self {
        HarvestError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for HarvestError {
    fn from(err: serde_json::Error) -> Self {
        HarvestError::Parse(err.to_string())
    }
}
