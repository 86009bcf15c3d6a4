//! Record source traits - the external capabilities the pipeline consumes
//!
//! Real connectors (data warehouse, fleet API) and the in-memory fixture
//! source implement the same traits, so the pipeline never knows which one
//! it is talking to.

use std::collections::BTreeSet;

use crate::{ContractError, GroupInfo, Page, RawMetadataRecord, RawMetricRecord, RecordFilter};

/// Cursor-paged metric record source
#[trait_variant::make(RecordSource: Send)]
pub trait LocalRecordSource {
    /// Source name (used for logging/metrics and error context)
    fn name(&self) -> &str;

    /// Fetch one page
    ///
    /// `cursor` is `None` for the first page and the previous page's
    /// `next_cursor` afterwards.
    ///
    /// # Errors
    /// Returns `Transport` if the page cannot be fetched
    async fn fetch_page(
        &self,
        filter: &RecordFilter,
        cursor: Option<&str>,
    ) -> Result<Page<RawMetricRecord>, ContractError>;
}

/// Device metadata source
#[trait_variant::make(MetadataSource: Send)]
pub trait LocalMetadataSource {
    /// Fetch all metadata records for the given serials
    ///
    /// # Errors
    /// Returns `Transport` if the fetch fails
    async fn fetch_metadata(
        &self,
        serials: &BTreeSet<String>,
    ) -> Result<Vec<RawMetadataRecord>, ContractError>;
}

/// Group membership resolver
#[trait_variant::make(GroupDirectory: Send)]
pub trait LocalGroupDirectory {
    /// List selectable groups
    async fn list_groups(&self) -> Result<Vec<GroupInfo>, ContractError>;

    /// Resolve a group id to its device serials
    ///
    /// An unknown group resolves to the empty set.
    async fn resolve_group(&self, group_id: &str) -> Result<BTreeSet<String>, ContractError>;
}
