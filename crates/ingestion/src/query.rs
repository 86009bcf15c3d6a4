//! Query runner - one full query cycle
//!
//! validate → resolve group → drain records → fetch metadata → resolve names → join
//!
//! Each cycle builds a fresh snapshot; nothing is carried over between runs.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use contracts::{
    AggregationMode, ContractError, GroupDirectory, GroupInfo, MetadataSource, NormalizedRow,
    PivotMatrix, QueryParams, QueryStats, RecordSource, Scope, SelectionSet, SeriesSet,
    TablePage, FLEET_GROUP_ID,
};
use metrics::{gauge, histogram};
use tracing::{info, instrument, warn};

use crate::config::IngestionMetrics;
use crate::error::Result;
use crate::paginator::Paginator;

/// Output of one query cycle
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub params: QueryParams,
    pub rows: Vec<NormalizedRow>,
    pub stats: QueryStats,
}

impl QueryResult {
    /// Full and selected time series
    pub fn series(&self, mode: AggregationMode, selected: &SelectionSet) -> SeriesSet {
        pivot_engine::build_series(&self.rows, mode, selected)
    }

    /// Vehicle × bucket matrix
    pub fn pivot(&self) -> PivotMatrix {
        pivot_engine::build_pivot(&self.rows)
    }

    /// One page of the flat table
    pub fn table(&self, page: usize, page_size: usize) -> std::result::Result<TablePage, ContractError> {
        pivot_engine::paginate(&self.rows, page, page_size)
    }
}

/// Runs query cycles against one source
pub struct QueryRunner<S> {
    source: Arc<S>,
    paginator: Paginator,
    metrics: Arc<IngestionMetrics>,
}

impl<S> Clone for QueryRunner<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            paginator: self.paginator,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<S> QueryRunner<S>
where
    S: RecordSource + MetadataSource + GroupDirectory + Sync,
{
    pub fn new(source: Arc<S>, paginator: Paginator) -> Self {
        Self {
            source,
            paginator,
            metrics: Arc::new(IngestionMetrics::new()),
        }
    }

    /// Share an existing metrics instance
    pub fn with_metrics(mut self, metrics: Arc<IngestionMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn metrics(&self) -> &Arc<IngestionMetrics> {
        &self.metrics
    }

    /// Selectable groups, fleet pseudo group first
    pub async fn list_groups(&self) -> Result<Vec<GroupInfo>> {
        Ok(self.source.list_groups().await?)
    }

    /// Run one query cycle
    ///
    /// A fleet query with no records yields an empty result; a group that
    /// resolves to no devices is an `EmptyResult` error.
    ///
    /// # Errors
    /// - `MissingParameter` / `ConfigValidation` for invalid parameters
    /// - `EmptyResult` if the group has no devices
    /// - `Transport` / `StalledCursor` if a fetch fails
    #[instrument(
        name = "query_cycle",
        skip(self, params),
        fields(
            source = %self.source.name(),
            metric = %params.metric,
            scope = %params.scope,
            granularity = %params.granularity,
        )
    )]
    pub async fn run_query(&self, params: &QueryParams) -> Result<QueryResult> {
        self.metrics.record_query();
        let result = self.run_cycle(params).await;
        if let Err(e) = &result {
            self.metrics.record_failure();
            warn!(error = %e, class = ?e.class(), "query cycle failed");
        }
        result
    }

    async fn run_cycle(&self, params: &QueryParams) -> Result<QueryResult> {
        let started = Instant::now();
        params.validate()?;

        let serials = self.scope_serials(params).await?;
        let filter = params.record_filter(serials);

        let drain = self.paginator.drain(self.source.as_ref(), &filter).await?;
        self.metrics.record_drain(drain.pages, drain.records.len());
        if drain.truncated {
            self.metrics.record_truncated();
        }

        let devices: BTreeSet<String> = drain
            .records
            .iter()
            .map(|r| r.serial.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let metadata = if devices.is_empty() {
            Vec::new()
        } else {
            self.source.fetch_metadata(&devices).await?
        };

        let names = pivot_engine::resolve(&metadata);
        let (rows, join_stats) =
            pivot_engine::join_with_stats(&drain.records, &names, params.granularity);

        let stats = QueryStats {
            pages_fetched: drain.pages,
            records_fetched: drain.records.len(),
            truncated: drain.truncated,
            metadata_records: metadata.len(),
            devices: devices.len(),
            rows_joined: join_stats.accepted,
            rows_dropped: join_stats.dropped(),
            duration_ms: started.elapsed().as_secs_f64() * 1000.0,
        };

        histogram!("fleetview_query_duration_ms").record(stats.duration_ms);
        gauge!("fleetview_rows_joined").set(stats.rows_joined as f64);
        info!(
            pages = stats.pages_fetched,
            records = stats.records_fetched,
            devices = stats.devices,
            rows = stats.rows_joined,
            dropped = stats.rows_dropped,
            truncated = stats.truncated,
            duration_ms = stats.duration_ms,
            "query cycle finished"
        );

        Ok(QueryResult {
            params: params.clone(),
            rows,
            stats,
        })
    }

    /// Serial filter for the query scope; `None` means fleet-wide
    async fn scope_serials(&self, params: &QueryParams) -> Result<Option<BTreeSet<String>>> {
        match (params.scope, params.group_id()) {
            (Scope::Group, Some(group)) if group != FLEET_GROUP_ID => {
                let serials = self.source.resolve_group(group).await?;
                if serials.is_empty() {
                    return Err(ContractError::empty_result(params.scope_label()).into());
                }
                Ok(Some(serials))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{Dataset, FixtureSource};
    use crate::mock;
    use crate::IngestionError;
    use chrono::NaiveDate;
    use contracts::{ErrorClass, Granularity, Metric, MockSourceConfig, VehicleKey};

    fn mock_runner(vehicles: usize, fail_on_page: Option<usize>) -> QueryRunner<FixtureSource> {
        let config = MockSourceConfig {
            vehicles,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            days: 10,
            samples_per_day: 2,
            fail_on_page,
        };
        let source = FixtureSource::new("mock", mock::generate(&config), 7)
            .with_fail_on_page(config.fail_on_page);
        QueryRunner::new(Arc::new(source), Paginator::default())
    }

    fn params(scope: Scope, group: Option<&str>) -> QueryParams {
        QueryParams {
            metric: Metric::Distance,
            scope,
            group_id: group.map(String::from),
            granularity: Granularity::Daily,
            from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_fleet_query() {
        let runner = mock_runner(4, None);
        let result = runner.run_query(&params(Scope::Fleet, None)).await.unwrap();

        assert_eq!(result.stats.records_fetched, 4 * 10 * 2);
        assert_eq!(result.stats.rows_joined, 80);
        assert_eq!(result.stats.devices, 4);
        assert_eq!(result.stats.pages_fetched, 12);
        assert!(!result.stats.truncated);

        let pivot = result.pivot();
        assert_eq!(pivot.buckets.len(), 10);
        assert_eq!(pivot.vehicles.len(), 4);

        let snap = runner.metrics().snapshot();
        assert_eq!(snap.queries, 1);
        assert_eq!(snap.records_fetched, 80);
    }

    #[tokio::test]
    async fn test_latest_metadata_name_used() {
        let runner = mock_runner(1, None);
        let result = runner.run_query(&params(Scope::Fleet, None)).await.unwrap();
        assert!(result.rows.iter().all(|r| !r.device_name.starts_with("OLD-")));
    }

    #[tokio::test]
    async fn test_group_query_restricts_devices() {
        let runner = mock_runner(4, None);
        let result = runner
            .run_query(&params(Scope::Group, Some("g2")))
            .await
            .unwrap();
        let serials: BTreeSet<_> = result.rows.iter().map(|r| r.device_serial.as_str()).collect();
        assert_eq!(serials, BTreeSet::from(["G9-MCK-002", "G9-MCK-004"]));
    }

    #[tokio::test]
    async fn test_fleet_group_id_means_fleet() {
        let runner = mock_runner(3, None);
        let result = runner
            .run_query(&params(Scope::Group, Some(FLEET_GROUP_ID)))
            .await
            .unwrap();
        assert_eq!(result.stats.devices, 3);
    }

    #[tokio::test]
    async fn test_empty_group_is_empty_result() {
        let runner = mock_runner(4, None);
        let err = runner
            .run_query(&params(Scope::Group, Some("g3")))
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::EmptyResult);
        assert_eq!(runner.metrics().snapshot().failed_queries, 1);
    }

    #[tokio::test]
    async fn test_group_scope_without_id() {
        let runner = mock_runner(2, None);
        let err = runner
            .run_query(&params(Scope::Group, Some("  ")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IngestionError::Contract(ContractError::MissingParameter { .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_aborts_cycle() {
        let runner = mock_runner(4, Some(3));
        let err = runner.run_query(&params(Scope::Fleet, None)).await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Transport);
    }

    #[tokio::test]
    async fn test_empty_fleet_is_not_an_error() {
        let source = FixtureSource::new("empty", Dataset::default(), 10);
        let runner = QueryRunner::new(Arc::new(source), Paginator::default());
        let result = runner.run_query(&params(Scope::Fleet, None)).await.unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(result.stats.metadata_records, 0);
        assert!(result.pivot().is_empty());
    }

    #[tokio::test]
    async fn test_series_and_table_views() {
        let runner = mock_runner(2, None);
        let result = runner.run_query(&params(Scope::Fleet, None)).await.unwrap();

        let first = &result.rows[0];
        let selected = SelectionSet::from([VehicleKey::new(&first.device_name, &first.device_serial)]);
        let series = result.series(AggregationMode::Sum, &selected);
        assert_eq!(series.full.len(), 10);
        assert_eq!(series.selected.len(), 10);

        let page = result.table(2, 15).unwrap();
        assert_eq!(page.total_rows, 40);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.rows.len(), 15);
    }
}
