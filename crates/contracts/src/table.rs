//! Pipeline outputs - normalized rows, series and the pivot matrix

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Joined, validated metric row
///
/// `bucket` is never empty and `value` is always finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub bucket: String,
    pub device_serial: String,
    pub device_name: String,
    pub value: f64,
}

impl NormalizedRow {
    /// Identity of the vehicle this row belongs to
    pub fn vehicle_key(&self) -> VehicleKey {
        VehicleKey::new(&self.device_name, &self.device_serial)
    }
}

/// Composite vehicle identity: display name plus serial
///
/// Ordering is by name, then serial.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleKey {
    pub device_name: String,
    pub device_serial: String,
}

impl VehicleKey {
    pub fn new(device_name: impl Into<String>, device_serial: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
            device_serial: device_serial.into(),
        }
    }

    /// Parse a `name|serial` selector as typed on the command line or in a query string
    ///
    /// Splits on the last `|`, so names may contain the character.
    pub fn parse_selector(selector: &str) -> Result<Self, ContractError> {
        let (name, serial) = selector.rsplit_once('|').ok_or_else(|| {
            ContractError::config_validation(
                "select",
                format!("expected 'name|serial', got '{selector}'"),
            )
        })?;
        if serial.trim().is_empty() {
            return Err(ContractError::config_validation(
                "select",
                format!("empty serial in '{selector}'"),
            ));
        }
        Ok(Self::new(name, serial.trim()))
    }
}

impl fmt::Display for VehicleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.device_name, self.device_serial)
    }
}

/// Vehicles chosen for the overlay series
pub type SelectionSet = BTreeSet<VehicleKey>;

/// How bucket values are combined into a series point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    #[default]
    Sum,
    Average,
}

impl std::str::FromStr for AggregationMode {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sum" => Ok(Self::Sum),
            "average" | "avg" => Ok(Self::Average),
            other => Err(ContractError::config_validation(
                "mode",
                format!("unsupported aggregation mode '{other}'"),
            )),
        }
    }
}

/// One point of a time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub bucket: String,
    pub value: f64,
}

/// Full-population series plus the selected-subset overlay
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSet {
    pub full: Vec<SeriesPoint>,
    /// Empty when no selection was given
    pub selected: Vec<SeriesPoint>,
}

/// Vehicle × bucket table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PivotMatrix {
    /// Distinct buckets, ascending
    pub buckets: Vec<String>,
    /// Vehicles ordered by (name, serial)
    pub vehicles: Vec<PivotVehicle>,
}

impl PivotMatrix {
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Look up a cell; `None` means no data for that bucket
    pub fn cell(&self, key: &VehicleKey, bucket: &str) -> Option<f64> {
        self.vehicles
            .iter()
            .find(|v| &v.key == key)
            .and_then(|v| v.values.get(bucket).copied())
    }
}

/// One pivot row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotVehicle {
    pub key: VehicleKey,
    pub device_name: String,
    pub device_serial: String,
    /// Sparse: a missing bucket means no records, not zero
    pub values: BTreeMap<String, f64>,
}

impl PivotVehicle {
    /// Sum over all buckets
    pub fn total(&self) -> f64 {
        self.values.values().sum()
    }
}

/// One page of the flat row table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePage {
    pub page: usize,
    pub page_size: usize,
    pub total_rows: usize,
    pub total_pages: usize,
    pub rows: Vec<NormalizedRow>,
}
