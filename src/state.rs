/// Application state held by the front end.
///
/// One instance owns the current sensor list, the map extent computed at
/// the last refresh and the selected sensor. Every user action goes through
/// a method here; nothing else keeps a copy of the list.

use crate::ingest::capabilities::fetch_capabilities;
use crate::ingest::describe::{enrich_all, SensorFeature};
use crate::ingest::http::{SosEndpoint, SosTransport};
use crate::ingest::observations::fetch_observations;
use crate::model::{BoundingBox, Reading, SensorRecord, SosError, TimeRange};
use crate::sensors::{bbox_from_bounds, filter_within, find_sensor, resolve_sensor};
use crate::time_codec::TimeCodec;

#[derive(Debug, Default)]
pub struct AppState {
    sensors: Vec<SensorRecord>,
    features: Vec<SensorFeature>,
    view_fit: Option<BoundingBox>,
    selected: Option<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reloads the sensor list: GetCapabilities, then DescribeSensor for
    /// every procedure in order.
    ///
    /// The previous list and selection are dropped before the request goes
    /// out, so a failed refresh leaves the state empty.
    pub fn refresh(
        &mut self,
        transport: &dyn SosTransport,
        endpoint: &SosEndpoint,
    ) -> Result<(), SosError> {
        self.sensors.clear();
        self.features.clear();
        self.view_fit = None;
        self.selected = None;

        let stubs = fetch_capabilities(transport, endpoint)?;
        let enrichment = enrich_all(transport, endpoint, stubs);

        self.view_fit = enrichment.view_fit();
        self.sensors = enrichment.records;
        self.features = enrichment.features;
        Ok(())
    }

    pub fn sensors(&self) -> &[SensorRecord] {
        &self.sensors
    }

    pub fn features(&self) -> &[SensorFeature] {
        &self.features
    }

    /// Extent to fit the map to after the last refresh, if any sensor had
    /// coordinates.
    pub fn view_fit(&self) -> Option<BoundingBox> {
        self.view_fit
    }

    /// Selects a sensor by full id or bare name.
    pub fn select(&mut self, key: &str) -> Result<&SensorRecord, SosError> {
        let id = resolve_sensor(&self.sensors, key)
            .map(|s| s.id.clone())
            .ok_or_else(|| SosError::ValidationError(format!("Unknown sensor: {}", key)))?;

        self.selected = Some(id);
        self.selected()
            .ok_or_else(|| SosError::ValidationError(format!("Unknown sensor: {}", key)))
    }

    pub fn selected(&self) -> Option<&SensorRecord> {
        self.selected
            .as_deref()
            .and_then(|id| find_sensor(&self.sensors, id))
    }

    /// Start/end fields pre-filled from the selected sensor's available
    /// data interval, or the default range when nothing is selected.
    pub fn default_range(&self, codec: &TimeCodec) -> TimeRange {
        match self.selected() {
            Some(sensor) => codec.parse_time_interval(Some(&sensor.time_interval)),
            None => TimeRange::default(),
        }
    }

    /// Sensors inside the user-entered bounds, in list order.
    pub fn filter(
        &self,
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    ) -> Result<Vec<&SensorRecord>, SosError> {
        let bbox = bbox_from_bounds(min_lon, min_lat, max_lon, max_lat)?;
        Ok(filter_within(&self.sensors, &bbox))
    }

    /// Readings of the selected sensor over `range`.
    pub fn observe(
        &self,
        transport: &dyn SosTransport,
        endpoint: &SosEndpoint,
        codec: &TimeCodec,
        range: &TimeRange,
    ) -> Result<Vec<Reading>, SosError> {
        let sensor = self.selected().ok_or_else(|| {
            SosError::ValidationError("Please select a sensor first".to_string())
        })?;
        fetch_observations(transport, endpoint, codec, sensor, range)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
