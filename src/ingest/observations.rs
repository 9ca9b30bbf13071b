/// GetObservation client.
///
/// istSOS returns the readings of one procedure as a single `swe:values`
/// text block: records separated by `@`, fields by `,`, the first field
/// being the UTC timestamp and the second the value.

use reqwest::Url;

use crate::ingest::http::{SosEndpoint, SosTransport};
use crate::ingest::xml::XmlDocument;
use crate::logging::{self, Operation};
use crate::model::{Reading, SensorRecord, SosError, TimeRange};
use crate::time_codec::TimeCodec;

const BLOCK_SEPARATOR: char = '@';
const TOKEN_SEPARATOR: char = ',';

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

/// GetObservation for a bare procedure name over `start/end` (wire format).
pub fn build_observation_url(
    endpoint: &SosEndpoint,
    procedure_name: &str,
    start_utc: &str,
    end_utc: &str,
    observed_property: &str,
) -> Result<Url, SosError> {
    let event_time = format!("{}/{}", start_utc, end_utc);
    endpoint.request_url(&[
        ("request", "GetObservation"),
        ("service", "SOS"),
        ("version", "1.0.0"),
        ("offering", endpoint.offering.as_str()),
        ("procedure", procedure_name),
        ("eventTime", event_time.as_str()),
        ("observedProperty", observed_property),
        ("responseFormat", "text/xml"),
    ])
}

// ---------------------------------------------------------------------------
// Payload decoding
// ---------------------------------------------------------------------------

/// Decodes a `swe:values` text block into readings, in payload order.
///
/// Records missing either the timestamp or the value are skipped; a field
/// holding only whitespace counts as present. A value that is not a number
/// becomes NaN. A timestamp that cannot be read keeps
/// the reading with empty local date/time fields.
pub fn parse_sensor_readings(values_text: &str, codec: &TimeCodec) -> Vec<Reading> {
    let mut readings = Vec::new();

    for record in values_text.split(BLOCK_SEPARATOR) {
        let mut fields = record.split(TOKEN_SEPARATOR);
        let (timestamp, value) = match (fields.next(), fields.next()) {
            (Some(t), Some(v)) if !t.is_empty() && !v.is_empty() => (t.trim(), v.trim()),
            _ => continue,
        };

        let (date, time) = match codec.to_local_fields(timestamp) {
            Ok(fields) => fields,
            Err(e) => {
                logging::warn(Operation::GetObservation, None, &e.to_string());
                (String::new(), String::new())
            }
        };

        readings.push(Reading {
            timestamp: timestamp.to_string(),
            date,
            time,
            value: value.parse().unwrap_or(f64::NAN),
        });
    }

    readings
}

/// Pulls the readings out of a GetObservation response.
///
/// # Errors
/// - `SosError::ParseError`: the body is not well-formed XML.
/// - `SosError::DataError`: exception report, or no `swe:values` node.
pub fn parse_observation_response(xml: &str, codec: &TimeCodec) -> Result<Vec<Reading>, SosError> {
    let doc = XmlDocument::parse(xml)?;
    if let Some(message) = doc.exception_report() {
        return Err(SosError::DataError(message));
    }

    let values = doc
        .first_by_tag("swe:values")
        .ok_or_else(|| SosError::DataError("No sensor data found in response".to_string()))?;

    Ok(parse_sensor_readings(values.text_content().trim(), codec))
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

/// Retrieves the readings of `sensor` between two local date/time pairs.
///
/// Input is validated before anything goes on the wire: an empty sensor
/// id or any empty range field is a `ValidationError`.
pub fn fetch_observations(
    transport: &dyn SosTransport,
    endpoint: &SosEndpoint,
    codec: &TimeCodec,
    sensor: &SensorRecord,
    range: &TimeRange,
) -> Result<Vec<Reading>, SosError> {
    let result = request_observations(transport, endpoint, codec, sensor, range);

    match &result {
        Ok(readings) => logging::info(
            Operation::GetObservation,
            Some(&sensor.id),
            &format!("{} readings retrieved", readings.len()),
        ),
        Err(e) => {
            let procedure = Some(sensor.id.as_str()).filter(|id| !id.is_empty());
            logging::log_sos_failure(Operation::GetObservation, procedure, e);
        }
    }

    result
}

fn request_observations(
    transport: &dyn SosTransport,
    endpoint: &SosEndpoint,
    codec: &TimeCodec,
    sensor: &SensorRecord,
    range: &TimeRange,
) -> Result<Vec<Reading>, SosError> {
    if sensor.id.trim().is_empty() {
        return Err(SosError::ValidationError(
            "Please select a sensor first".to_string(),
        ));
    }
    if !range.is_complete() {
        return Err(SosError::ValidationError(
            "Please specify a valid time range".to_string(),
        ));
    }

    let start = codec.adjust_to_utc(&range.start_date, &range.start_time)?;
    let end = codec.adjust_to_utc(&range.end_date, &range.end_time)?;

    let url = build_observation_url(
        endpoint,
        sensor.procedure_name(),
        &start,
        &end,
        &sensor.observed_property,
    )?;
    logging::debug(Operation::GetObservation, Some(&sensor.id), &format!("GET {}", url));

    let body = transport.get_text(&url)?;
    parse_observation_response(&body, codec)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
