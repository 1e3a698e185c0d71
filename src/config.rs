use crate::error::{HarvestError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use time::OffsetDateTime;

pub const DEFAULT_ROOT: &str = "data/reddit/00_raw";
pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;
pub const MAX_PAGE_SIZE: u32 = 100;

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct HarvestOptions {
    pub root: PathBuf,
    pub subreddit: Option<String>, // trimmed, no "r/"
    pub lookback_days: u32,
    pub page_size: u32,            // 1..=100
    pub progress: bool,            // show progress bar on comment runs
    pub now: Option<OffsetDateTime>, // fixed clock; None = system time
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            subreddit: None,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            page_size: MAX_PAGE_SIZE,
            progress: true,
            now: None,
        }
    }
}

impl HarvestOptions {
    pub fn with_root(mut self, root: impl AsRef<Path>) -> Self {
        self.root = root.as_ref().to_path_buf();
        self
    }
    pub fn with_subreddit(mut self, sub: impl AsRef<str>) -> Self {
        self.subreddit = Some(strip_subject(sub.as_ref()));
        self
    }
    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }
    pub fn with_page_size(mut self, n: u32) -> Self {
        self.page_size = clamp_page_size(n);
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_now(mut self, now: OffsetDateTime) -> Self {
        self.now = Some(now);
        self
    }

    pub fn now(&self) -> OffsetDateTime {
        self.now.unwrap_or_else(OffsetDateTime::now_utc)
    }

    /// The configured subreddit, validated.
    pub fn subject(&self) -> Result<&str> {
        let s = self.subreddit.as_deref().unwrap_or_default();
        if subject_re()?.is_match(s) {
            Ok(s)
        } else {
            Err(HarvestError::InvalidSubject(s.to_string()))
        }
    }
}

/// Out-of-range page sizes (0 or above the API maximum) fall back to the maximum.
pub fn clamp_page_size(n: u32) -> u32 {
    if n == 0 || n > MAX_PAGE_SIZE {
        MAX_PAGE_SIZE
    } else {
        n
    }
}

fn strip_subject(raw: &str) -> String {
    let s = raw.trim();
    let s = s.strip_prefix("/").unwrap_or(s);
    s.strip_prefix("r/").unwrap_or(s).to_string()
}

fn subject_re() -> Result<&'static Regex> {
    static RE: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_]{1,20}$"))
        .as_ref()
        .map_err(|e| HarvestError::InvalidSubject(format!("subject pattern: {e}")))
}

/// OAuth application credentials.
#[derive(Clone)]
pub struct Credentials {
    pub user_agent: String,
    pub client_id: String,
    pub client_secret: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    /// Username and password, when both are set and non-empty.
    pub fn password_grant(&self) -> Option<(&str, &str)> {
        let user = self.username.as_deref().filter(|s| !s.is_empty())?;
        let pass = self.password.as_deref().filter(|s| !s.is_empty())?;
        Some((user, pass))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user_agent", &self.user_agent)
            .field("client_id", &self.client_id)
            .field("grant", &if self.password_grant().is_some() { "password" } else { "client_credentials" })
            .finish_non_exhaustive()
    }
}
