/// SensorStub, SensorRecord, BoundingBox, Reading, TimeRange, SosError
/// core data structures and error handling
///
/// Core data types for the SOS dashboard.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O, only types and the small amount of arithmetic that
/// belongs to them (bounding-box folding, name derivation).

use serde::Serialize;

// ---------------------------------------------------------------------------
// Placeholder values
// ---------------------------------------------------------------------------

/// Description recorded when a DescribeSensor round-trip fails.
pub const DESCRIPTION_ERROR: &str = "Error loading details";

/// Description used when the SensorML document has no `gml:description`.
pub const DESCRIPTION_MISSING: &str = "No description available";

/// Time interval used when the SensorML document has no `swe:interval`.
pub const INTERVAL_MISSING: &str = "N/A";

/// Sensor type / observed property fallback.
pub const UNKNOWN: &str = "Unknown";

// ---------------------------------------------------------------------------
// Sensor types
// ---------------------------------------------------------------------------

/// Returns the segment after the last `:` of a procedure identifier, or
/// the whole identifier if it contains no colon.
///
/// `urn:ogc:def:procedure:x-istsos:1.0:RAIN_01` → `RAIN_01`
pub fn bare_name(id: &str) -> &str {
    id.rsplit(':').next().unwrap_or(id)
}

/// A procedure listed in the GetCapabilities document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorStub {
    /// Opaque procedure identifier, unique within one capabilities document.
    pub id: String,
    /// Derived: last colon-delimited segment of `id`.
    pub name: String,
}

impl SensorStub {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let name = bare_name(&id).to_string();
        Self { id, name }
    }
}

/// A stub enriched with the DescribeSensor details.
///
/// Filled once by `ingest::describe::enrich_all` and never mutated again.
/// `coordinates` is `Some` only when the detail fetch succeeded and the
/// document carried a parseable `lon,lat` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    /// `(longitude, latitude)`
    pub coordinates: Option<(f64, f64)>,
    pub observed_property: String,
    pub time_interval: String,
    pub sensor_type: String,
}

impl SensorRecord {
    /// A record with empty detail fields, as it exists before enrichment.
    pub fn from_stub(stub: SensorStub) -> Self {
        Self {
            id: stub.id,
            name: stub.name,
            description: String::new(),
            coordinates: None,
            observed_property: String::new(),
            time_interval: String::new(),
            sensor_type: String::new(),
        }
    }

    /// The procedure name GetObservation expects (after the last `:`).
    pub fn procedure_name(&self) -> &str {
        bare_name(&self.id)
    }
}

// ---------------------------------------------------------------------------
// Bounding box
// ---------------------------------------------------------------------------

/// Extent of all coordinate-bearing sensors, in WGS84 degrees.
///
/// Starts at the `(+inf, +inf, -inf, -inf)` sentinel and only ever widens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    pub fn empty() -> Self {
        Self {
            min_lon: f64::INFINITY,
            min_lat: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
            max_lat: f64::NEG_INFINITY,
        }
    }

    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self { min_lon, min_lat, max_lon, max_lat }
    }

    /// Widens the box to include `(lon, lat)`.
    pub fn extend(&mut self, lon: f64, lat: f64) {
        self.min_lon = self.min_lon.min(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lon = self.max_lon.max(lon);
        self.max_lat = self.max_lat.max(lat);
    }

    /// True while no point has been folded in.
    pub fn is_empty(&self) -> bool {
        self.min_lon == f64::INFINITY
    }

    /// Inclusive containment test.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

// ---------------------------------------------------------------------------
// Readings and time fields
// ---------------------------------------------------------------------------

/// One decoded `timestamp,value` pair from a `swe:values` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// Raw wire value, e.g. "2023-01-01T00:00:00Z".
    pub timestamp: String,
    /// Local date, YYYY-MM-DD.
    pub date: String,
    /// Local time, HH:MM:SS.
    pub time: String,
    /// NaN when the wire value is not numeric.
    pub value: f64,
}

/// Local start/end date and time fields, as a user enters them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
}

impl Default for TimeRange {
    fn default() -> Self {
        Self {
            start_date: String::new(),
            start_time: "00:00".to_string(),
            end_date: String::new(),
            end_time: "23:59".to_string(),
        }
    }
}

impl TimeRange {
    /// True when every field is filled in.
    pub fn is_complete(&self) -> bool {
        !self.start_date.is_empty()
            && !self.start_time.is_empty()
            && !self.end_date.is_empty()
            && !self.end_time.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when talking to the SOS endpoint or validating
/// user input.
#[derive(Debug, Clone, PartialEq)]
pub enum SosError {
    /// Non-2xx HTTP response from the SOS endpoint.
    HttpError(u16),
    /// The request never produced a response (DNS, connect, timeout, body read).
    RequestFailed(String),
    /// The response body is not well-formed XML.
    ParseError(String),
    /// Required user input is missing or malformed.
    ValidationError(String),
    /// The response is well-formed but lacks the expected content.
    DataError(String),
}

impl SosError {
    /// HttpError and RequestFailed together form the network error class.
    pub fn is_network(&self) -> bool {
        matches!(self, SosError::HttpError(_) | SosError::RequestFailed(_))
    }
}

impl std::fmt::Display for SosError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SosError::HttpError(code) => write!(f, "HTTP error! Status: {}", code),
            SosError::RequestFailed(msg) => write!(f, "Request failed: {}", msg),
            SosError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            SosError::ValidationError(msg) => write!(f, "{}", msg),
            SosError::DataError(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SosError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_name_is_last_colon_segment() {
        let stub = SensorStub::new("urn:ogc:def:procedure:x-istsos:1.0:RAIN_01");
        assert_eq!(stub.name, "RAIN_01");
    }

    #[test]
    fn test_stub_name_without_colon_is_whole_id() {
        let stub = SensorStub::new("RAIN_01");
        assert_eq!(stub.name, "RAIN_01");
    }

    #[test]
    fn test_bounding_box_over_two_points() {
        let mut bbox = BoundingBox::empty();
        bbox.extend(10.0, 20.0);
        bbox.extend(30.0, 5.0);
        assert_eq!(bbox, BoundingBox::new(10.0, 5.0, 30.0, 20.0));
        assert!(!bbox.is_empty());
    }

    #[test]
    fn test_empty_bounding_box_keeps_sentinel() {
        let bbox = BoundingBox::default();
        assert!(bbox.is_empty());
        assert_eq!(bbox.min_lon, f64::INFINITY);
        assert_eq!(bbox.max_lat, f64::NEG_INFINITY);
        assert!(!bbox.contains(0.0, 0.0));
    }

    #[test]
    fn test_bounding_box_contains_is_inclusive() {
        let bbox = BoundingBox::new(10.0, 5.0, 30.0, 20.0);
        assert!(bbox.contains(10.0, 5.0));
        assert!(bbox.contains(30.0, 20.0));
        assert!(!bbox.contains(30.1, 20.0));
    }

    #[test]
    fn test_default_time_range() {
        let range = TimeRange::default();
        assert_eq!(range.start_time, "00:00");
        assert_eq!(range.end_time, "23:59");
        assert!(!range.is_complete());
    }

    #[test]
    fn test_network_error_class() {
        assert!(SosError::HttpError(500).is_network());
        assert!(SosError::RequestFailed("timeout".into()).is_network());
        assert!(!SosError::DataError("empty".into()).is_network());
        assert_eq!(SosError::HttpError(404).to_string(), "HTTP error! Status: 404");
    }
}
