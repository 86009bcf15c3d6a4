//! Metadata resolution - one display name per serial
//!
//! Resolution is a fold over the metadata records with an explicit
//! "supersedes" comparator. The default comparator keeps the record with
//! the greatest timestamp string; on an exact tie the first-seen record stays.

use std::collections::HashMap;

use contracts::RawMetadataRecord;

/// Authoritative name for one serial
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    pub display_name: String,
    pub timestamp: String,
}

/// serial → resolved name
pub type NameMap = HashMap<String, ResolvedName>;

/// Default comparator: strictly greater timestamp string wins
///
/// Comparison is lexical, so mixed precision or mixed timezone timestamps
/// do not order chronologically.
pub fn newer_timestamp(candidate: &RawMetadataRecord, current: &ResolvedName) -> bool {
    candidate.timestamp.as_str() > current.timestamp.as_str()
}

/// Resolve names with the default comparator
pub fn resolve(records: &[RawMetadataRecord]) -> NameMap {
    resolve_with(records, newer_timestamp)
}

/// Resolve names with a custom comparator
///
/// `supersedes(candidate, current)` decides whether a later record replaces
/// the stored entry for the same serial. Records with an empty (trimmed)
/// serial are skipped.
pub fn resolve_with<F>(records: &[RawMetadataRecord], supersedes: F) -> NameMap
where
    F: Fn(&RawMetadataRecord, &ResolvedName) -> bool,
{
    records.iter().fold(NameMap::new(), |mut names, record| {
        let serial = record.serial.trim();
        if serial.is_empty() {
            return names;
        }

        let replace = match names.get(serial) {
            Some(current) => supersedes(record, current),
            None => true,
        };
        if replace {
            names.insert(
                serial.to_string(),
                ResolvedName {
                    display_name: record.display_name.clone(),
                    timestamp: record.timestamp.clone(),
                },
            );
        }
        names
    })
}
