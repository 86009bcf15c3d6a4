//! Query parameters and the filter handed to record sources

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Id of the built-in pseudo group covering the whole fleet
pub const FLEET_GROUP_ID: &str = "GroupFleet";

/// Bucketing resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    #[default]
    Daily,
    Monthly,
}

impl Granularity {
    /// Length of the timestamp prefix that forms a bucket key
    pub fn prefix_len(self) -> usize {
        match self {
            Self::Daily => 10,
            Self::Monthly => 7,
        }
    }

    /// Aggregate table the source reads for this granularity
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Daily => "VehicleKpi_Daily",
            Self::Monthly => "VehicleKpi_Monthly",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
        }
    }
}

/// Telemetry metric being charted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Distance,
    Fuel,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Distance => "distance",
            Self::Fuel => "fuel",
        }
    }
}

/// Query breadth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    #[default]
    Fleet,
    Group,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fleet => "fleet",
            Self::Group => "group",
        }
    }
}

macro_rules! impl_str_enum {
    ($ty:ty, $what:literal, [$($text:literal => $variant:expr),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = ContractError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($variant),)+
                    other => Err(ContractError::config_validation(
                        $what,
                        format!("unsupported value '{other}'"),
                    )),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_str_enum!(Granularity, "granularity", ["daily" => Granularity::Daily, "monthly" => Granularity::Monthly]);
impl_str_enum!(Metric, "metric", ["distance" => Metric::Distance, "fuel" => Metric::Fuel]);
impl_str_enum!(Scope, "scope", ["fleet" => Scope::Fleet, "group" => Scope::Group]);

/// Parameters of one query cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    pub metric: Metric,
    pub scope: Scope,
    #[serde(default)]
    pub group_id: Option<String>,
    pub granularity: Granularity,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl QueryParams {
    /// Check that the parameters describe a runnable query
    ///
    /// # Errors
    /// - `MissingParameter` if group scope has no group id
    /// - `ConfigValidation` if the date range is inverted
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.scope == Scope::Group && self.group_id().is_none() {
            return Err(ContractError::missing_parameter("group_id"));
        }
        if self.from > self.to {
            return Err(ContractError::config_validation(
                "from / to",
                format!("from ({}) must be <= to ({})", self.from, self.to),
            ));
        }
        Ok(())
    }

    /// Trimmed, non-empty group id
    pub fn group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
    }

    /// Human-readable scope, used in "no devices" messaging
    pub fn scope_label(&self) -> String {
        match (self.scope, self.group_id()) {
            (Scope::Group, Some(group)) => format!("group '{group}'"),
            _ => "fleet".to_string(),
        }
    }

    /// Build the source filter for this query
    pub fn record_filter(&self, serials: Option<BTreeSet<String>>) -> RecordFilter {
        RecordFilter {
            table: self.granularity.table_name().to_string(),
            metric: self.metric,
            from: self.from,
            to: self.to,
            serials,
        }
    }
}

/// Opaque filter passed to `RecordSource::fetch_page`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Granularity-derived table name
    pub table: String,
    pub metric: Metric,
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Restrict to these serials (`None` = fleet-wide)
    #[serde(default)]
    pub serials: Option<BTreeSet<String>>,
}

impl RecordFilter {
    /// Whether a timestamp falls in `[from, to]`, compared on its date prefix
    pub fn covers_timestamp(&self, timestamp: &str) -> bool {
        let day = timestamp.get(..10).unwrap_or(timestamp);
        let from = self.from.format("%Y-%m-%d").to_string();
        let to = self.to.format("%Y-%m-%d").to_string();
        day >= from.as_str() && day <= to.as_str()
    }

    /// Whether a serial passes the serial-set filter
    pub fn covers_serial(&self, serial: &str) -> bool {
        match &self.serials {
            Some(set) => set.contains(serial.trim()),
            None => true,
        }
    }
}

/// Device group as listed by the group directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub id: String,
    pub name: String,
}
