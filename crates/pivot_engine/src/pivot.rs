//! Vehicle × bucket pivot

use std::collections::{BTreeMap, BTreeSet};

use contracts::{NormalizedRow, PivotMatrix, PivotVehicle, VehicleKey};

/// Pivot normalized rows into a vehicle × bucket matrix
///
/// Values sharing a vehicle and bucket are summed. Buckets ascend; vehicles
/// are ordered by `(device_name, device_serial)`. Cells with no rows stay
/// absent so they can be told apart from a real zero.
pub fn pivot(rows: &[NormalizedRow]) -> PivotMatrix {
    let mut buckets: BTreeSet<&str> = BTreeSet::new();
    let mut vehicles: BTreeMap<VehicleKey, BTreeMap<String, f64>> = BTreeMap::new();

    for row in rows {
        buckets.insert(row.bucket.as_str());
        let cells = vehicles.entry(row.vehicle_key()).or_default();
        *cells.entry(row.bucket.clone()).or_insert(0.0) += row.value;
    }

    PivotMatrix {
        buckets: buckets.into_iter().map(str::to_string).collect(),
        vehicles: vehicles
            .into_iter()
            .map(|(key, values)| PivotVehicle {
                device_name: key.device_name.clone(),
                device_serial: key.device_serial.clone(),
                key,
                values,
            })
            .collect(),
    }
}
