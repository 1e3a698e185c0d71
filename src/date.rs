//! Time helpers: the compact UTC stamp used in bucket and snapshot names, and
//! the run cutoff derived from a lookback window.

use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

/// Length of a formatted stamp.
pub const STAMP_LEN: usize = 12;

/// Format a UTC instant as a compact stamp (e.g. `250314093000`).
pub fn stamp(t: OffsetDateTime) -> String {
    let t = t.to_offset(time::UtcOffset::UTC);
    // YYMMDDHHMMSS. The description only uses fields every OffsetDateTime carries.
    let fmt = format_description!("[year repr:last_two][month][day][hour][minute][second]");
    t.format(fmt).unwrap_or_else(|_| {
        format!(
            "{:02}{:02}{:02}{:02}{:02}{:02}",
            t.year().rem_euclid(100),
            u8::from(t.month()),
            t.day(),
            t.hour(),
            t.minute(),
            t.second()
        )
    })
}

/// Stamp for a unix epoch in seconds. Out-of-range epochs clamp to the epoch origin.
pub fn stamp_unix(secs: i64) -> String {
    stamp(OffsetDateTime::from_unix_timestamp(secs).unwrap_or(OffsetDateTime::UNIX_EPOCH))
}

/// Parse a `YYMMDDHHMMSS` stamp back to UTC. Two-digit years map to 2000..=2099.
pub fn parse_stamp(s: &str) -> Option<OffsetDateTime> {
    if s.len() != STAMP_LEN || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let full = format!("20{s}");
    let fmt = format_description!("[year][month][day][hour][minute][second]");
    PrimitiveDateTime::parse(&full, fmt).ok().map(|p| p.assume_utc())
}

/// Earliest creation time (unix seconds) a run considers.
pub fn cutoff_unix(now: OffsetDateTime, lookback_days: u32) -> i64 {
    (now - Duration::days(i64::from(lookback_days))).unix_timestamp()
}
