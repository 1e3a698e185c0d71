//! Cutoff-driven walk over a newest-first listing.
//!
//! Pages are assumed to be time-descending. The first item older than the
//! cutoff ends the walk; anything after it on the same page is not looked at,
//! even if it happens to be newer.

use crate::config::clamp_page_size;
use crate::error::{HarvestError, Result};
use crate::json_utils::created_utc_strict;
use crate::source::ListingFetcher;
use serde_json::value::RawValue;
use serde_json::Value;
use tracing::{debug, info};

/// One emitted listing record.
#[derive(Debug)]
pub struct ListingItem {
    pub id: String,
    /// Fullname (`t3_...`), used as the pagination reference.
    pub name: String,
    pub created_utc: i64,
    /// Parsed record, for projection.
    pub value: Value,
    /// Verbatim bytes, for storage.
    pub raw: Box<RawValue>,
}

impl ListingItem {
    /// Extract creation time and ids. Missing or malformed ones fail the item.
    pub fn from_raw(raw: Box<RawValue>) -> Result<Self> {
        let value: Value = serde_json::from_str(raw.get())?;
        let created_utc = created_utc_strict(&value).ok_or_else(|| {
            let msg = if value.get("created_utc").is_some() { "bad created_utc" } else { "no created_utc" };
            HarvestError::parse(msg)
        })?;
        let id = value.get("id").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let name = value.get("name").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        if id.is_empty() || name.is_empty() {
            return Err(HarvestError::parse("no id/name"));
        }
        Ok(Self { id, name, created_utc, value, raw })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub pages: u64,
    pub emitted: u64,
    /// Emitted items the callback reported as stored.
    pub wrote: u64,
    pub stopped_at_cutoff: bool,
}

pub struct Walker<'a, F: ListingFetcher> {
    fetcher: &'a F,
    subject: &'a str,
    cutoff: i64,
    page_size: u32,
}

impl<'a, F: ListingFetcher> Walker<'a, F> {
    pub fn new(fetcher: &'a F, subject: &'a str, cutoff: i64, page_size: u32) -> Self {
        Self { fetcher, subject, cutoff, page_size: clamp_page_size(page_size) }
    }

    /// Walk pages, calling `on_item` for every item with `created_utc >= cutoff`.
    /// The callback returns whether it stored the item.
    ///
    /// Any fetch, extraction or callback error ends the walk and is returned.
    pub fn walk(&self, mut on_item: impl FnMut(ListingItem) -> Result<bool>) -> Result<WalkSummary> {
        let mut summary = WalkSummary::default();
        let mut cursor: Option<String> = None;

        loop {
            summary.pages += 1;
            let page = self.fetcher.list_new(self.subject, cursor.as_deref(), self.page_size)?;
            if page.items.is_empty() {
                debug!(sub = self.subject, page = summary.pages, "empty page");
                break;
            }

            let mut next: Option<String> = None;
            let mut stop = false;
            let mut emitted_here = 0u64;
            let mut wrote_here = 0u64;
            for raw in page.items {
                let item = ListingItem::from_raw(raw)?;
                if item.created_utc < self.cutoff {
                    stop = true;
                    break;
                }
                next = Some(item.name.clone());
                if on_item(item)? {
                    wrote_here += 1;
                }
                emitted_here += 1;
            }
            summary.emitted += emitted_here;
            summary.wrote += wrote_here;

            info!(
                sub = self.subject,
                page = summary.pages,
                wrote = wrote_here,
                after = next.as_deref().unwrap_or(""),
                stop,
                "listing page"
            );

            if stop {
                summary.stopped_at_cutoff = true;
                break;
            }
            match next {
                Some(n) => cursor = Some(n),
                None => break,
            }
        }
        Ok(summary)
    }
}
