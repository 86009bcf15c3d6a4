//! Paginator - drains a cursor-paged source into one collection
//!
//! The drain is all-or-nothing: a failed page fails the whole drain and the
//! caller re-runs the cycle from the first page. Cursors are never resumed
//! across invocations.

use std::collections::HashSet;

use contracts::{RawMetricRecord, RecordFilter, RecordSource};
use metrics::counter;
use tracing::{debug, instrument, warn};

use crate::config::DrainConfig;
use crate::error::{IngestionError, Result};

/// Result of one drain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Drain {
    pub records: Vec<RawMetricRecord>,
    pub pages: usize,
    /// Stopped because the safety cap was exceeded
    pub truncated: bool,
}

/// Cursor-following page collector
#[derive(Debug, Clone, Copy, Default)]
pub struct Paginator {
    config: DrainConfig,
}

impl Paginator {
    pub fn new(config: DrainConfig) -> Self {
        Self { config }
    }

    pub fn max_records(&self) -> usize {
        self.config.max_records
    }

    /// Fetch pages until the cursor runs out or the cap is exceeded
    ///
    /// The cap is checked after each page is appended, so a truncated drain
    /// holds at most `max_records` plus one page.
    ///
    /// # Errors
    /// - `Transport` if any page fetch fails
    /// - `StalledCursor` if the source hands back any cursor already followed
    ///   in this drain
    #[instrument(
        name = "ingestion_drain",
        skip(self, source, filter),
        fields(source = %source.name(), table = %filter.table, max_records = self.config.max_records)
    )]
    pub async fn drain<S>(&self, source: &S, filter: &RecordFilter) -> Result<Drain>
    where
        S: RecordSource + Sync,
    {
        let mut drain = Drain::default();
        let mut cursor: Option<String> = None;
        let mut followed: HashSet<String> = HashSet::new();

        loop {
            let page = source.fetch_page(filter, cursor.as_deref()).await?;
            drain.pages += 1;
            counter!("fleetview_pages_fetched_total").increment(1);
            counter!("fleetview_records_fetched_total").increment(page.items.len() as u64);

            let next = page.continuation().map(str::to_string);
            debug!(
                page = drain.pages,
                items = page.items.len(),
                has_next = next.is_some(),
                "page fetched"
            );
            drain.records.extend(page.items);

            if drain.records.len() > self.config.max_records {
                warn!(
                    collected = drain.records.len(),
                    cap = self.config.max_records,
                    "record cap exceeded, returning partial result"
                );
                drain.truncated = true;
                break;
            }

            match next {
                None => break,
                Some(next) if !followed.insert(next.clone()) => {
                    warn!(cursor = %next, pages = drain.pages, "cursor repeated, aborting drain");
                    return Err(IngestionError::StalledCursor {
                        source_name: source.name().to_string(),
                        cursor: next,
                    });
                }
                Some(next) => cursor = Some(next),
            }
        }

        Ok(drain)
    }
}
