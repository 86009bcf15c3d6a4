//! In-memory record source backed by a JSON dataset
//!
//! Serves cursor-paged metric records, device metadata and group membership
//! from one `Dataset`. The cursor is the decimal offset into the filtered
//! record list.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use contracts::{
    ContractError, GroupDirectory, GroupInfo, MetadataSource, Metric, Page, RawMetadataRecord,
    RawMetricRecord, RecordFilter, RecordSource, SourceConfig, SourceKind, FLEET_GROUP_ID,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{IngestionError, Result};
use crate::mock;

/// Display name of the fleet-wide pseudo group
pub const FLEET_GROUP_NAME: &str = "Entire Fleet";

/// Metric samples, one table per metric
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricTables {
    #[serde(default)]
    pub distance: Vec<RawMetricRecord>,
    #[serde(default)]
    pub fuel: Vec<RawMetricRecord>,
}

impl MetricTables {
    pub fn table(&self, metric: Metric) -> &[RawMetricRecord] {
        match metric {
            Metric::Distance => &self.distance,
            Metric::Fuel => &self.fuel,
        }
    }

    pub fn len(&self) -> usize {
        self.distance.len() + self.fuel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named device group and its members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub serials: BTreeSet<String>,
}

/// Everything a fixture source serves
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub records: MetricTables,
    #[serde(default)]
    pub metadata: Vec<RawMetadataRecord>,
    #[serde(default)]
    pub groups: Vec<GroupDefinition>,
}

impl Dataset {
    /// Load a dataset from a JSON file
    ///
    /// # Errors
    /// Returns `DatasetLoad` if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| IngestionError::DatasetLoad {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content).map_err(|e| match e {
            IngestionError::DatasetLoad { message, .. } => IngestionError::DatasetLoad {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Parse a dataset from a JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| IngestionError::DatasetLoad {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Every trimmed, non-empty serial appearing in records or metadata
    pub fn serials(&self) -> BTreeSet<String> {
        self.records
            .distance
            .iter()
            .chain(&self.records.fuel)
            .map(|r| r.serial.as_str())
            .chain(self.metadata.iter().map(|m| m.serial.as_str()))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Record source, metadata source and group directory over one dataset
#[derive(Debug, Clone)]
pub struct FixtureSource {
    name: String,
    dataset: Arc<Dataset>,
    page_size: usize,
    fail_on_page: Option<usize>,
}

impl FixtureSource {
    pub fn new(name: impl Into<String>, dataset: Dataset, page_size: usize) -> Self {
        Self {
            name: name.into(),
            dataset: Arc::new(dataset),
            page_size: page_size.max(1),
            fail_on_page: None,
        }
    }

    /// Fail with a transport error whenever this page (1-based) is requested
    pub fn with_fail_on_page(mut self, page: Option<usize>) -> Self {
        self.fail_on_page = page;
        self
    }

    /// Build the source a configuration describes
    ///
    /// # Errors
    /// - `ConfigValidation` if a fixture source has no path
    /// - `DatasetLoad` if the fixture file cannot be loaded
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let source = match config.kind {
            SourceKind::Fixture => {
                let path = config.path.as_ref().ok_or_else(|| {
                    ContractError::config_validation("source.path", "fixture source needs a path")
                })?;
                let dataset = Dataset::load(path)?;
                info!(
                    path = %path.display(),
                    records = dataset.records.len(),
                    metadata = dataset.metadata.len(),
                    groups = dataset.groups.len(),
                    "fixture dataset loaded"
                );
                Self::new("fixture", dataset, config.page_size)
            }
            SourceKind::Mock => {
                let dataset = mock::generate(&config.mock);
                info!(
                    vehicles = config.mock.vehicles,
                    days = config.mock.days,
                    records = dataset.records.len(),
                    "mock dataset generated"
                );
                Self::new("mock", dataset, config.page_size)
                    .with_fail_on_page(config.mock.fail_on_page)
            }
        };
        Ok(source)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn parse_cursor(&self, cursor: Option<&str>) -> std::result::Result<usize, ContractError> {
        match cursor {
            None => Ok(0),
            Some(c) => c.parse().map_err(|_| {
                ContractError::transport(&self.name, format!("invalid cursor '{c}'"))
            }),
        }
    }
}

impl RecordSource for FixtureSource {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "fixture_fetch_page",
        skip(self, filter),
        fields(source = %self.name, metric = %filter.metric)
    )]
    async fn fetch_page(
        &self,
        filter: &RecordFilter,
        cursor: Option<&str>,
    ) -> std::result::Result<Page<RawMetricRecord>, ContractError> {
        let offset = self.parse_cursor(cursor)?;
        let page_number = offset / self.page_size + 1;
        if self.fail_on_page == Some(page_number) {
            return Err(ContractError::transport(
                &self.name,
                format!("injected failure on page {page_number}"),
            ));
        }

        let mut matching = self
            .dataset
            .records
            .table(filter.metric)
            .iter()
            .filter(|r| filter.covers_timestamp(&r.timestamp) && filter.covers_serial(&r.serial))
            .skip(offset);

        let items: Vec<RawMetricRecord> = matching.by_ref().take(self.page_size).cloned().collect();
        let next_offset = offset + items.len();
        let next_cursor = matching.next().map(|_| next_offset.to_string());

        debug!(page = page_number, items = items.len(), "fixture page served");
        Ok(Page { items, next_cursor })
    }
}

impl MetadataSource for FixtureSource {
    async fn fetch_metadata(
        &self,
        serials: &BTreeSet<String>,
    ) -> std::result::Result<Vec<RawMetadataRecord>, ContractError> {
        Ok(self
            .dataset
            .metadata
            .iter()
            .filter(|m| serials.contains(m.serial.trim()))
            .cloned()
            .collect())
    }
}

impl GroupDirectory for FixtureSource {
    async fn list_groups(&self) -> std::result::Result<Vec<GroupInfo>, ContractError> {
        let fleet = GroupInfo {
            id: FLEET_GROUP_ID.to_string(),
            name: FLEET_GROUP_NAME.to_string(),
        };
        Ok(std::iter::once(fleet)
            .chain(self.dataset.groups.iter().map(|g| GroupInfo {
                id: g.id.clone(),
                name: g.name.clone(),
            }))
            .collect())
    }

    async fn resolve_group(
        &self,
        group_id: &str,
    ) -> std::result::Result<BTreeSet<String>, ContractError> {
        let group_id = group_id.trim();
        if group_id == FLEET_GROUP_ID {
            return Ok(self.dataset.serials());
        }
        Ok(self
            .dataset
            .groups
            .iter()
            .find(|g| g.id == group_id)
            .map(|g| g.serials.iter().map(|s| s.trim().to_string()).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use contracts::{ErrorClass, Granularity, QueryParams, Scope};
    use std::io::Write;

    const DATASET: &str = r#"{
        "records": {
            "distance": [
                {"timestamp": "2024-01-01T08:00:00Z", "serial": "S1", "value": 10.0},
                {"timestamp": "2024-01-02T08:00:00Z", "serial": "S1", "value": "12.5"},
                {"timestamp": "2024-01-02T09:00:00Z", "serial": "S2", "value": null},
                {"timestamp": "2024-02-01T08:00:00Z", "serial": "S2", "value": 3.0},
                {"timestamp": "2024-01-03T08:00:00Z", "serial": "S3", "value": 1.0}
            ]
        },
        "metadata": [
            {"serial": "S1", "displayName": "Truck 1", "timestamp": "2024-01-01"},
            {"serial": "S2", "display_name": "Van 2", "timestamp": "2024-01-01"}
        ],
        "groups": [
            {"id": "north", "name": "North", "serials": ["S1", " S3 "]},
            {"id": "empty", "name": "Nobody"}
        ]
    }"#;

    fn source(page_size: usize) -> FixtureSource {
        FixtureSource::new("test", Dataset::from_json(DATASET).unwrap(), page_size)
    }

    fn filter(to: (i32, u32, u32)) -> RecordFilter {
        QueryParams {
            metric: Metric::Distance,
            scope: Scope::Fleet,
            group_id: None,
            granularity: Granularity::Daily,
            from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(to.0, to.1, to.2).unwrap(),
        }
        .record_filter(None)
    }

    #[tokio::test]
    async fn test_pages_follow_offset_cursor() {
        let source = source(2);
        let f = filter((2024, 12, 31));

        let first = source.fetch_page(&f, None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.next_cursor.as_deref(), Some("2"));

        let second = source.fetch_page(&f, Some("2")).await.unwrap();
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.next_cursor.as_deref(), Some("4"));

        let last = source.fetch_page(&f, Some("4")).await.unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(last.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_date_and_serial_filters() {
        let source = source(10);
        let page = source.fetch_page(&filter((2024, 1, 31)), None).await.unwrap();
        assert_eq!(page.items.len(), 4);

        let mut f = filter((2024, 12, 31));
        f.serials = Some(BTreeSet::from(["S2".to_string()]));
        let page = source.fetch_page(&f, None).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|r| r.serial == "S2"));
    }

    #[tokio::test]
    async fn test_empty_metric_table() {
        let source = source(10);
        let mut f = filter((2024, 12, 31));
        f.metric = Metric::Fuel;
        let page = source.fetch_page(&f, None).await.unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let source = source(2).with_fail_on_page(Some(2));
        let f = filter((2024, 12, 31));
        assert!(source.fetch_page(&f, None).await.is_ok());
        let err = source.fetch_page(&f, Some("2")).await.unwrap_err();
        assert!(matches!(err, ContractError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_bad_cursor_is_transport_error() {
        let err = source(2)
            .fetch_page(&filter((2024, 12, 31)), Some("abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_metadata_filtered_by_serial() {
        let meta = source(10)
            .fetch_metadata(&BTreeSet::from(["S2".to_string()]))
            .await
            .unwrap();
        assert_eq!(meta.len(), 1);
        assert_eq!(meta[0].display_name, "Van 2");
    }

    #[tokio::test]
    async fn test_groups() {
        let source = source(10);
        let groups = source.list_groups().await.unwrap();
        assert_eq!(groups[0].id, FLEET_GROUP_ID);
        assert_eq!(groups[0].name, FLEET_GROUP_NAME);
        assert_eq!(groups.len(), 3);

        let north = source.resolve_group("north").await.unwrap();
        assert_eq!(north, BTreeSet::from(["S1".to_string(), "S3".to_string()]));
        assert!(source.resolve_group("empty").await.unwrap().is_empty());
        assert!(source.resolve_group("unknown").await.unwrap().is_empty());
        assert_eq!(source.resolve_group(FLEET_GROUP_ID).await.unwrap().len(), 3);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DATASET.as_bytes()).unwrap();
        let dataset = Dataset::load(file.path()).unwrap();
        assert_eq!(dataset.records.distance.len(), 5);
        assert_eq!(dataset.groups.len(), 2);
    }

    #[test]
    fn test_from_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DATASET.as_bytes()).unwrap();
        let config = SourceConfig {
            kind: SourceKind::Fixture,
            path: Some(file.path().to_path_buf()),
            page_size: 3,
            ..SourceConfig::default()
        };

        let source = FixtureSource::from_config(&config).unwrap();
        assert_eq!(source.name(), "fixture");
        assert_eq!(source.page_size(), 3);
        assert_eq!(source.dataset().records.distance.len(), 5);

        let missing = SourceConfig {
            kind: SourceKind::Fixture,
            path: None,
            ..SourceConfig::default()
        };
        let err = FixtureSource::from_config(&missing).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Config);
    }

    #[test]
    fn test_load_errors() {
        let err = Dataset::load("/nonexistent/fleet.json").unwrap_err();
        assert!(matches!(err, IngestionError::DatasetLoad { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let err = Dataset::load(file.path()).unwrap_err();
        match err {
            IngestionError::DatasetLoad { path, .. } => {
                assert_eq!(path, file.path().display().to_string())
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
