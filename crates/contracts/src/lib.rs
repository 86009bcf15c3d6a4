//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Timestamps are ISO-8601 strings, expected in UTC
//! - Buckets are lexical prefixes of those strings; no timezone conversion happens anywhere

mod config;
mod error;
mod query;
mod record;
mod sink;
mod source;
mod stats;
mod table;

pub use config::*;
pub use error::*;
pub use query::*;
pub use record::*;
pub use sink::*;
pub use source::{
    GroupDirectory, LocalGroupDirectory, LocalMetadataSource, LocalRecordSource, MetadataSource,
    RecordSource,
};
pub use stats::QueryStats;
pub use table::*;
