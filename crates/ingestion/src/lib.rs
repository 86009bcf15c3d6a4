//! # Ingestion
//!
//! Query-cycle module: pulls raw records out of a source and hands joined
//! rows to the pivot engine.
//!
//! Responsibilities:
//! - Drain cursor-paged record sources (`Paginator`, with a safety cap)
//! - Resolve group scope into a serial filter
//! - Fetch metadata for the devices seen and join names onto records
//! - Fixture and mock sources for running without a live connector
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ingestion::{FixtureSource, Paginator, QueryRunner};
//!
//! let source = FixtureSource::from_config(&config.source)?;
//! let runner = QueryRunner::new(Arc::new(source), Paginator::new((&config.source).into()));
//!
//! let result = runner.run_query(&config.query.to_params(today)).await?;
//! let matrix = result.pivot();
//! ```

mod config;
mod error;
mod fixture;
pub mod mock;
mod paginator;
mod query;

// Re-exports
pub use config::{DrainConfig, IngestionMetrics, MetricsSnapshot};
pub use error::{IngestionError, Result};
pub use fixture::{Dataset, FixtureSource, GroupDefinition, MetricTables, FLEET_GROUP_NAME};
pub use paginator::{Drain, Paginator};
pub use query::{QueryResult, QueryRunner};
