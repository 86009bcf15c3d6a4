//! Timestamp → bucket key
//!
//! A bucket is a lexical prefix of the timestamp string. No parsing and no
//! timezone conversion happen here; callers must feed timestamps in one zone.

use contracts::Granularity;

/// Bucket key for `timestamp` at `granularity`
///
/// Daily buckets are `YYYY-MM-DD`, monthly buckets `YYYY-MM`. An empty
/// timestamp yields an empty bucket, which callers must treat as invalid.
/// Timestamps shorter than the prefix are returned whole.
pub fn bucket(timestamp: &str, granularity: Granularity) -> &str {
    let len = granularity.prefix_len();
    match timestamp.char_indices().nth(len) {
        Some((idx, _)) => &timestamp[..idx],
        None => timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_bucket() {
        assert_eq!(bucket("2024-03-15T10:00:00Z", Granularity::Monthly), "2024-03");
    }

    #[test]
    fn test_daily_bucket() {
        assert_eq!(bucket("2024-03-15T10:00:00Z", Granularity::Daily), "2024-03-15");
    }

    #[test]
    fn test_empty_timestamp() {
        assert_eq!(bucket("", Granularity::Daily), "");
        assert_eq!(bucket("", Granularity::Monthly), "");
    }

    #[test]
    fn test_short_timestamp_kept_whole() {
        assert_eq!(bucket("2024-03", Granularity::Daily), "2024-03");
        assert_eq!(bucket("2024-03-15", Granularity::Daily), "2024-03-15");
    }

    #[test]
    fn test_no_timezone_conversion() {
        // Same instant, different zone: buckets differ because the prefix is lexical
        assert_eq!(bucket("2024-03-15T23:30:00-02:00", Granularity::Daily), "2024-03-15");
        assert_eq!(bucket("2024-03-16T01:30:00Z", Granularity::Daily), "2024-03-16");
    }
}
