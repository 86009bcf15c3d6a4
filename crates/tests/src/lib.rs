//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 内存数据源 e2e 测试（fixture / mock，无需外部连接）
//! - 记录上限与失败路径

#[cfg(test)]
mod contract_tests {
    use contracts::{ContractError, ErrorClass, Granularity};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
        assert_eq!(contracts::FLEET_GROUP_ID, "GroupFleet");
    }

    #[test]
    fn test_error_taxonomy() {
        let cases = [
            (ContractError::missing_parameter("group_id"), ErrorClass::Config),
            (ContractError::transport("src", "down"), ErrorClass::Transport),
            (ContractError::empty_result("group 'g'"), ErrorClass::EmptyResult),
            (ContractError::empty_export("rows"), ErrorClass::EmptyExport),
        ];
        for (error, class) in cases {
            assert_eq!(error.class(), class, "{error}");
        }
    }

    #[test]
    fn test_bucket_prefixes() {
        assert_eq!(pivot_engine::bucket("2024-03-15T10:00:00Z", Granularity::Daily), "2024-03-15");
        assert_eq!(pivot_engine::bucket("2024-03-15T10:00:00Z", Granularity::Monthly), "2024-03");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use chrono::NaiveDate;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        AggregationMode, ErrorClass, Granularity, Metric, MockSourceConfig, QueryParams, Scope,
        SelectionSet, SinkConfig, SinkType, VehicleKey,
    };
    use exporter::{ExportSource, Publisher};
    use ingestion::{mock, Dataset, DrainConfig, FixtureSource, Paginator, QueryRunner};
    use observability::QueryStatsAggregator;

    /// Two vehicles over three days; S1 was renamed and has two samples on day one
    const TWO_VEHICLES: &str = r#"{
        "records": {
            "distance": [
                {"timestamp": "2024-03-01T08:00:00Z", "serial": "S1", "value": 10.0},
                {"timestamp": "2024-03-01T17:00:00Z", "serial": "S1", "value": 5.5},
                {"timestamp": "2024-03-02T08:00:00Z", "serial": "S1", "value": "12.25"},
                {"timestamp": "2024-03-03T08:00:00Z", "serial": "S1", "value": 7.0},
                {"timestamp": "2024-03-01T09:00:00Z", "serial": "S2", "value": 3.0},
                {"timestamp": "2024-03-02T09:00:00Z", "serial": "S2", "value": 4.5},
                {"timestamp": "2024-03-03T09:00:00Z", "serial": "S2", "value": 6.1},
                {"timestamp": "2024-03-03T10:00:00Z", "serial": "S2", "value": null}
            ]
        },
        "metadata": [
            {"serial": "S1", "display_name": "Truck 1", "timestamp": "2024-01-01"},
            {"serial": "S1", "display_name": "Truck One", "timestamp": "2024-02-01"},
            {"serial": "S2", "display_name": "Van 2", "timestamp": "2024-01-01"}
        ],
        "groups": [
            {"id": "vans", "name": "Vans", "serials": ["S2"]},
            {"id": "empty", "name": "Nobody"}
        ]
    }"#;

    fn params(scope: Scope, group_id: Option<&str>) -> QueryParams {
        QueryParams {
            metric: Metric::Distance,
            scope,
            group_id: group_id.map(String::from),
            granularity: Granularity::Daily,
            from: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        }
    }

    fn fixture_runner(page_size: usize, fail_on_page: Option<usize>) -> QueryRunner<FixtureSource> {
        let dataset = Dataset::from_json(TWO_VEHICLES).unwrap();
        let source = FixtureSource::new("fixture", dataset, page_size).with_fail_on_page(fail_on_page);
        QueryRunner::new(Arc::new(source), Paginator::default())
    }

    /// End-to-end test: FixtureSource -> QueryRunner -> pivot -> CSV
    ///
    /// 验证完整的数据流：
    /// 1. 分页读取全部记录（每页 2 条）
    /// 2. 名称 "latest wins"，空值记录被丢弃
    /// 3. 透视矩阵 2 × 3，CSV 保留两位小数
    #[tokio::test]
    async fn test_e2e_fixture_pivot_csv() {
        let runner = fixture_runner(2, None);
        let result = runner.run_query(&params(Scope::Fleet, None)).await.unwrap();

        assert_eq!(result.stats.pages_fetched, 4);
        assert_eq!(result.stats.records_fetched, 8);
        assert_eq!(result.stats.rows_joined, 7);
        assert_eq!(result.stats.rows_dropped, 1);
        assert!(!result.stats.truncated);

        let matrix = result.pivot();
        assert_eq!(matrix.buckets, ["2024-03-01", "2024-03-02", "2024-03-03"]);
        assert_eq!(matrix.vehicles.len(), 2);
        assert_eq!(matrix.vehicles[0].device_name, "Truck One");

        let content = exporter::export_csv(ExportSource::Pivot(&matrix)).unwrap();
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(
            header,
            ["device_name", "device_serial", "2024-03-01", "2024-03-02", "2024-03-03"]
        );

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].iter().collect::<Vec<_>>(),
            ["Truck One", "S1", "15.50", "12.25", "7.00"]
        );
        assert_eq!(
            records[1].iter().collect::<Vec<_>>(),
            ["Van 2", "S2", "3.00", "4.50", "6.10"]
        );
    }

    #[tokio::test]
    async fn test_e2e_series_with_selection() {
        let runner = fixture_runner(3, None);
        let result = runner.run_query(&params(Scope::Fleet, None)).await.unwrap();

        let selected = SelectionSet::from([VehicleKey::new("Van 2", "S2")]);
        let series = result.series(AggregationMode::Sum, &selected);
        let full: Vec<f64> = series.full.iter().map(|p| p.value).collect();
        assert_eq!(full.len(), 3);
        assert!((full[0] - 18.5).abs() < 1e-9);
        assert!((full[1] - 16.75).abs() < 1e-9);
        assert!((full[2] - 13.1).abs() < 1e-9);

        let selected: Vec<f64> = series.selected.iter().map(|p| p.value).collect();
        assert_eq!(selected, [3.0, 4.5, 6.1]);

        let average = result.series(AggregationMode::Average, &SelectionSet::new());
        // three rows on day one: 10.0, 5.5 and 3.0
        assert!((average.full[0].value - 18.5 / 3.0).abs() < 1e-9);
        assert!(average.selected.is_empty());
    }

    #[tokio::test]
    async fn test_e2e_group_scope() {
        let runner = fixture_runner(2, None);
        let result = runner
            .run_query(&params(Scope::Group, Some("vans")))
            .await
            .unwrap();

        assert!(result.rows.iter().all(|r| r.device_serial == "S2"));
        assert_eq!(result.rows.len(), 3);
    }

    #[tokio::test]
    async fn test_e2e_empty_group() {
        let runner = fixture_runner(2, None);
        let err = runner
            .run_query(&params(Scope::Group, Some("empty")))
            .await
            .unwrap_err();

        assert_eq!(err.class(), ErrorClass::EmptyResult);
        assert!(err.to_string().contains("group 'empty'"));
    }

    #[tokio::test]
    async fn test_e2e_transport_failure_aborts() {
        let runner = fixture_runner(2, Some(3));
        let err = runner
            .run_query(&params(Scope::Fleet, None))
            .await
            .unwrap_err();

        assert_eq!(err.class(), ErrorClass::Transport);
        assert_eq!(runner.metrics().snapshot().failed_queries, 1);
    }

    /// 超过 50,000 条记录时截断：最多多取一页
    #[tokio::test]
    async fn test_e2e_record_cap() {
        let config = MockSourceConfig {
            vehicles: 200,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            days: 150,
            samples_per_day: 2,
            fail_on_page: None,
        };
        let dataset = mock::generate(&config);
        assert_eq!(dataset.records.distance.len(), 60_000);

        let source = FixtureSource::new("mock", dataset, 500);
        let runner = QueryRunner::new(Arc::new(source), Paginator::new(DrainConfig::default()));
        let mut query = params(Scope::Fleet, None);
        query.from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        query.to = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();

        let result = runner.run_query(&query).await.unwrap();
        assert!(result.stats.truncated);
        assert!(result.stats.records_fetched > 50_000);
        assert!(result.stats.records_fetched <= 50_000 + 500);
        assert_eq!(runner.metrics().snapshot().truncated_drains, 1);
    }

    #[tokio::test]
    async fn test_e2e_publish_to_file_sink() {
        let runner = fixture_runner(5, None);
        let result = runner.run_query(&params(Scope::Fleet, None)).await.unwrap();
        let export = exporter::render(
            ExportSource::Rows(&result.rows),
            Metric::Distance,
            Granularity::Daily,
        )
        .unwrap();
        assert_eq!(export.line_count, 7);

        let dir = tempfile::tempdir().unwrap();
        let mut params = HashMap::new();
        params.insert(
            "base_path".to_string(),
            dir.path().to_string_lossy().into_owned(),
        );
        let configs = vec![
            SinkConfig {
                name: "console".into(),
                sink_type: SinkType::Log,
                params: HashMap::new(),
            },
            SinkConfig {
                name: "disk".into(),
                sink_type: SinkType::File,
                params,
            },
        ];

        let mut publisher = Publisher::from_configs(&configs).unwrap();
        let report = publisher.publish(&export).await;
        publisher.shutdown().await;

        assert!(report.all_delivered());
        assert_eq!(report.delivered.len(), 2);

        let written =
            std::fs::read_to_string(dir.path().join("fleetview-distance-daily.csv")).unwrap();
        assert_eq!(written, export.content);
        assert!(written.starts_with("bucket,device_name,device_serial,value\n"));
        assert!(written.contains("2024-03-01,Truck One,S1,10.00\n"));
    }

    /// 配置文件 -> mock 数据源 -> 多次查询统计汇总
    #[tokio::test]
    async fn test_e2e_config_driven_queries() {
        let toml = r#"
[source]
kind = "mock"
page_size = 50

[source.mock]
vehicles = 6
days = 20

[query]
scope = "group"
group_id = "g1"
granularity = "monthly"
from = "2024-01-01"
to = "2024-03-31"
"#;
        let config = ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap();
        let source = FixtureSource::from_config(&config.source).unwrap();
        let runner = QueryRunner::new(
            Arc::new(source),
            Paginator::new(DrainConfig::from(&config.source)),
        );
        let params = config.query.to_params(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());

        let mut aggregator = QueryStatsAggregator::new();
        for _ in 0..3 {
            let result = runner.run_query(&params).await.unwrap();
            aggregator.update(&result.stats);
        }

        // g1 holds the even-indexed vehicles: 3 of 6
        let result = runner.run_query(&params).await.unwrap();
        let matrix = result.pivot();
        assert_eq!(matrix.buckets, ["2024-01"]);
        assert_eq!(matrix.vehicles.len(), 3);
        assert_eq!(result.stats.records_fetched, 3 * 20 * 2);

        let summary = aggregator.summary();
        assert_eq!(summary.total_queries, 3);
        assert_eq!(summary.failed_queries, 0);
        assert_eq!(summary.total_records, 3 * 120);
    }
}
