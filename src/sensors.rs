/// Lookups over the enriched sensor list.
///
/// The list itself comes from the service at refresh time; these helpers
/// only search and filter it, always preserving capability order.

use crate::model::{bare_name, BoundingBox, SensorRecord, SosError};

/// Message shown when a bounding-box filter matches nothing.
pub const NO_SENSORS_IN_BBOX: &str = "No sensors found within the specified bounding box";

/// Looks up a sensor by full procedure id. Returns `None` if not found.
pub fn find_sensor<'a>(sensors: &'a [SensorRecord], id: &str) -> Option<&'a SensorRecord> {
    sensors.iter().find(|s| s.id == id)
}

/// Looks up a sensor by full id or, failing that, by bare name
/// (`RAIN_BLR` for `urn:...:RAIN_BLR`).
pub fn resolve_sensor<'a>(sensors: &'a [SensorRecord], key: &str) -> Option<&'a SensorRecord> {
    find_sensor(sensors, key).or_else(|| sensors.iter().find(|s| s.name == key))
}

/// Sensors measuring a given property. Matches either the full property
/// URN or its last segment (`rainfall`).
pub fn sensors_with_property<'a>(
    sensors: &'a [SensorRecord],
    property: &str,
) -> Vec<&'a SensorRecord> {
    sensors
        .iter()
        .filter(|s| s.observed_property == property || bare_name(&s.observed_property) == property)
        .collect()
}

/// Builds a filter box from user-entered bounds.
///
/// Every bound must be a finite number; `min > max` simply matches nothing.
pub fn bbox_from_bounds(
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
) -> Result<BoundingBox, SosError> {
    if [min_lon, min_lat, max_lon, max_lat].iter().all(|v| v.is_finite()) {
        Ok(BoundingBox::new(min_lon, min_lat, max_lon, max_lat))
    } else {
        Err(SosError::ValidationError(
            "Please enter valid bounding box coordinates".to_string(),
        ))
    }
}

/// Sensors whose coordinates fall inside `bbox` (edges included).
/// Sensors without coordinates never match.
pub fn filter_within<'a>(sensors: &'a [SensorRecord], bbox: &BoundingBox) -> Vec<&'a SensorRecord> {
    sensors
        .iter()
        .filter(|s| matches!(s.coordinates, Some((lon, lat)) if bbox.contains(lon, lat)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
