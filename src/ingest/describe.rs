/// DescribeSensor client and the sequential enrichment loop.
///
/// Each capability stub gets one DescribeSensor round-trip. The loop runs
/// strictly one request at a time in capability order: a request starts
/// only after the previous result (success or failure) has been applied,
/// so the enriched list always comes back in the order it went in.

use reqwest::Url;
use serde::Serialize;

use crate::ingest::http::{SosEndpoint, SosTransport};
use crate::ingest::xml::XmlDocument;
use crate::logging::{self, Operation};
use crate::model::{
    BoundingBox, SensorRecord, SensorStub, SosError, DESCRIPTION_ERROR, DESCRIPTION_MISSING,
    INTERVAL_MISSING, UNKNOWN,
};

const SENSORML_FORMAT: &str = "text/xml;subtype=\"sensorML/1.0.1\"";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Fields scraped from one SensorML document.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorDetails {
    pub description: String,
    pub coordinates: Option<(f64, f64)>,
    pub observed_property: String,
    pub time_interval: String,
    pub sensor_type: String,
}

/// A map point for a sensor that reported coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorFeature {
    pub id: String,
    pub lon: f64,
    pub lat: f64,
}

/// Result of enriching a whole capability list.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    /// Same length and order as the input stubs.
    pub records: Vec<SensorRecord>,
    /// Fold of every record's coordinates.
    pub bbox: BoundingBox,
    /// One per coordinate-bearing record, in record order.
    pub features: Vec<SensorFeature>,
    /// Ids whose detail fetch failed, in record order.
    pub failed: Vec<String>,
}

impl Enrichment {
    /// The extent to fit the map to, or `None` when no sensor had coordinates.
    pub fn view_fit(&self) -> Option<BoundingBox> {
        if self.bbox.is_empty() {
            None
        } else {
            Some(self.bbox)
        }
    }

    /// Number of records whose detail fetch failed.
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

/// DescribeSensor for the full procedure id, asking for SensorML 1.0.1.
pub fn build_describe_url(endpoint: &SosEndpoint, procedure_id: &str) -> Result<Url, SosError> {
    endpoint.request_url(&[
        ("service", "SOS"),
        ("version", "1.0.0"),
        ("request", "DescribeSensor"),
        ("procedure", procedure_id),
        ("outputFormat", SENSORML_FORMAT),
    ])
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Parses `gml:coordinates` text as `lon,lat[,alt]`.
///
/// Returns `None` unless the first two comma-separated fields are both
/// finite numbers.
pub fn parse_coordinates(text: &str) -> Option<(f64, f64)> {
    let mut fields = text.split(',').map(str::trim);
    let lon: f64 = fields.next()?.parse().ok()?;
    let lat: f64 = fields.next()?.parse().ok()?;
    if lon.is_finite() && lat.is_finite() {
        Some((lon, lat))
    } else {
        None
    }
}

/// Scrapes the detail fields from a DescribeSensor response.
///
/// Absent fields fall back to their defaults; only malformed XML or an
/// exception report is an error.
pub fn parse_sensor_details(xml: &str) -> Result<SensorDetails, SosError> {
    let doc = XmlDocument::parse(xml)?;
    if let Some(message) = doc.exception_report() {
        return Err(SosError::DataError(message));
    }

    let description = doc
        .first_by_tag("gml:description")
        .map(|el| el.text_content().trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| DESCRIPTION_MISSING.to_string());

    let coordinates = doc
        .first_by_tag("gml:coordinates")
        .and_then(|el| parse_coordinates(&el.text_content()));

    let observed_property = doc
        .first_by_tag("swe:Quantity")
        .and_then(|el| el.attribute("definition"))
        .filter(|d| !d.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string();

    let time_interval = doc
        .first_by_tag("swe:interval")
        .map(|el| el.text_content().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| INTERVAL_MISSING.to_string());

    let sensor_type = doc
        .elements_by_tag("sml:classifier")
        .into_iter()
        .find(|c| c.attribute("name") == Some("Sensor Type"))
        .and_then(|c| c.first_by_tag("sml:value"))
        .map(|v| v.text_content().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string());

    Ok(SensorDetails {
        description,
        coordinates,
        observed_property,
        time_interval,
        sensor_type,
    })
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

/// One DescribeSensor round-trip for a full procedure id.
pub fn describe_sensor(
    transport: &dyn SosTransport,
    endpoint: &SosEndpoint,
    procedure_id: &str,
) -> Result<SensorDetails, SosError> {
    let url = build_describe_url(endpoint, procedure_id)?;
    logging::debug(Operation::DescribeSensor, Some(procedure_id), &format!("GET {}", url));
    let body = transport.get_text(&url)?;
    parse_sensor_details(&body)
}

/// Enriches every stub, one request at a time, in list order.
///
/// A failed fetch leaves that record with the "Error loading details"
/// description and no coordinates; the batch carries on with the next
/// stub. Coordinates from successful fetches are folded into the bounding
/// box and registered as map features.
pub fn enrich_all(
    transport: &dyn SosTransport,
    endpoint: &SosEndpoint,
    stubs: Vec<SensorStub>,
) -> Enrichment {
    let total = stubs.len();
    let mut records = Vec::with_capacity(total);
    let mut bbox = BoundingBox::empty();
    let mut features = Vec::new();
    let mut failed = Vec::new();

    for stub in stubs {
        let mut record = SensorRecord::from_stub(stub);

        match describe_sensor(transport, endpoint, &record.id) {
            Ok(details) => {
                record.description = details.description;
                record.coordinates = details.coordinates;
                record.observed_property = details.observed_property;
                record.time_interval = details.time_interval;
                record.sensor_type = details.sensor_type;

                if let Some((lon, lat)) = record.coordinates {
                    bbox.extend(lon, lat);
                    features.push(SensorFeature {
                        id: record.id.clone(),
                        lon,
                        lat,
                    });
                }
            }
            Err(e) => {
                logging::log_sos_failure(Operation::DescribeSensor, Some(&record.id), &e);
                record.description = DESCRIPTION_ERROR.to_string();
                failed.push(record.id.clone());
            }
        }

        records.push(record);
    }

    logging::log_enrichment_summary(total, total - failed.len(), features.len());

    Enrichment {
        records,
        bbox,
        features,
        failed,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::*;

    fn endpoint() -> SosEndpoint {
        SosEndpoint::new("http://sos.example.org")
    }

    // --- URL construction ---------------------------------------------------

    #[test]
    fn test_describe_url_carries_full_procedure_id_and_sensorml_format() {
        let url = build_describe_url(&endpoint(), "urn:ogc:def:procedure:x-istsos:1.0:RAIN_BLR")
            .expect("valid endpoint");
        assert_eq!(
            query_value(&url, "procedure").as_deref(),
            Some("urn:ogc:def:procedure:x-istsos:1.0:RAIN_BLR")
        );
        assert_eq!(query_value(&url, "request").as_deref(), Some("DescribeSensor"));
        assert_eq!(query_value(&url, "version").as_deref(), Some("1.0.0"));
        assert_eq!(query_value(&url, "outputFormat").as_deref(), Some(SENSORML_FORMAT));
    }

    // --- Parsing ------------------------------------------------------------

    #[test]
    fn test_parse_full_sensorml() {
        let details = parse_sensor_details(fixture_describe_rain_xml())
            .expect("valid fixture should parse without error");

        assert_eq!(details.description, "Tipping bucket rain gauge on the IISc campus roof");
        assert_eq!(details.coordinates, Some((77.5667, 12.9716)));
        assert_eq!(
            details.observed_property,
            "urn:ogc:def:parameter:x-istsos:1.0:meteo:air:rainfall"
        );
        assert_eq!(
            details.time_interval,
            "2023-06-03T20:00:00+0530 2023-06-10T08:15:00+0530"
        );
        assert_eq!(details.sensor_type, "tipping bucket");
    }

    #[test]
    fn test_parse_sparse_sensorml_uses_defaults() {
        let details = parse_sensor_details(fixture_describe_no_coords_xml()).expect("parses");

        assert_eq!(details.description, DESCRIPTION_MISSING);
        assert_eq!(details.coordinates, None, "'unknown' is not a lon,lat pair");
        assert_eq!(
            details.observed_property,
            "urn:ogc:def:parameter:x-istsos:1.0:meteo:air:humidity:relative"
        );
        assert_eq!(details.time_interval, INTERVAL_MISSING);
        assert_eq!(details.sensor_type, UNKNOWN);
    }

    #[test]
    fn test_classifier_other_than_sensor_type_is_ignored() {
        let details = parse_sensor_details(
            r#"<sml:SensorML>
                 <sml:classifier name="System Type"><sml:value>fixed</sml:value></sml:classifier>
               </sml:SensorML>"#,
        )
        .expect("parses");
        assert_eq!(details.sensor_type, UNKNOWN);
    }

    #[test]
    fn test_parse_coordinates() {
        assert_eq!(parse_coordinates("10,20"), Some((10.0, 20.0)));
        assert_eq!(parse_coordinates(" 8.96 , 46.02 , 273 "), Some((8.96, 46.02)));
        assert_eq!(parse_coordinates("10"), None);
        assert_eq!(parse_coordinates("10,north"), None);
        assert_eq!(parse_coordinates(""), None);
        assert_eq!(parse_coordinates("NaN,5"), None);
    }

    // --- Enrichment ---------------------------------------------------------

    #[test]
    fn test_middle_failure_keeps_order_and_batch() {
        let stubs = vec![
            SensorStub::new("urn:x:A"),
            SensorStub::new("urn:x:B"),
            SensorStub::new("urn:x:C"),
        ];
        let transport = ScriptedTransport::new()
            .route("DescribeSensor", Some("urn:x:A"), Ok(fixture_describe_rain_xml()))
            .route("DescribeSensor", Some("urn:x:B"), Err(SosError::HttpError(500)))
            .route("DescribeSensor", Some("urn:x:C"), Ok(fixture_describe_no_coords_xml()));

        let enrichment = enrich_all(&transport, &endpoint(), stubs);

        let ids: Vec<&str> = enrichment.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["urn:x:A", "urn:x:B", "urn:x:C"]);
        assert_eq!(
            transport.procedures_requested(),
            vec!["urn:x:A", "urn:x:B", "urn:x:C"],
            "requests must go out one per stub, in list order"
        );

        assert_eq!(enrichment.records[0].sensor_type, "tipping bucket");
        assert_eq!(enrichment.records[1].description, DESCRIPTION_ERROR);
        assert_eq!(enrichment.records[1].coordinates, None);
        assert_eq!(enrichment.records[2].description, DESCRIPTION_MISSING);
        assert_eq!(enrichment.failed_count(), 1);
    }

    #[test]
    fn test_malformed_detail_document_is_a_per_sensor_failure() {
        let transport = ScriptedTransport::new()
            .route("DescribeSensor", None, Ok("<sml:SensorML><gml:description>"));
        let enrichment = enrich_all(&transport, &endpoint(), vec![SensorStub::new("urn:x:A")]);
        assert_eq!(enrichment.records[0].description, DESCRIPTION_ERROR);
        assert_eq!(enrichment.failed, vec!["urn:x:A".to_string()]);
    }

    #[test]
    fn test_failures_are_counted_by_outcome_not_description() {
        let transport = ScriptedTransport::new().route(
            "DescribeSensor",
            Some("urn:x:A"),
            Ok("<sml:SensorML><gml:description>Error loading details</gml:description></sml:SensorML>"),
        );
        let stubs = vec![SensorStub::new("urn:x:A"), SensorStub::new("urn:x:B")];
        let enrichment = enrich_all(&transport, &endpoint(), stubs);

        assert_eq!(enrichment.records[0].description, DESCRIPTION_ERROR);
        assert_eq!(enrichment.failed_count(), 1);
        assert_eq!(enrichment.failed, vec!["urn:x:B".to_string()]);
    }

    #[test]
    fn test_bbox_and_features_from_coordinates() {
        let located = |lon: f64, lat: f64| {
            format!(
                "<sml:SensorML><gml:coordinates>{},{}</gml:coordinates></sml:SensorML>",
                lon, lat
            )
        };
        let a = located(10.0, 20.0);
        let b = located(30.0, 5.0);
        let transport = ScriptedTransport::new()
            .route("DescribeSensor", Some("urn:x:A"), Ok(a.as_str()))
            .route("DescribeSensor", Some("urn:x:B"), Ok(b.as_str()));

        let enrichment = enrich_all(
            &transport,
            &endpoint(),
            vec![SensorStub::new("urn:x:A"), SensorStub::new("urn:x:B")],
        );

        assert_eq!(enrichment.bbox, BoundingBox::new(10.0, 5.0, 30.0, 20.0));
        assert_eq!(enrichment.view_fit(), Some(BoundingBox::new(10.0, 5.0, 30.0, 20.0)));
        assert_eq!(enrichment.features.len(), 2);
        assert_eq!(enrichment.features[1].id, "urn:x:B");
    }

    #[test]
    fn test_no_coordinates_means_no_view_fit() {
        let transport = ScriptedTransport::new()
            .route("DescribeSensor", None, Ok(fixture_describe_no_coords_xml()));
        let enrichment = enrich_all(&transport, &endpoint(), vec![SensorStub::new("urn:x:A")]);

        assert!(enrichment.bbox.is_empty());
        assert_eq!(enrichment.view_fit(), None);
        assert!(enrichment.features.is_empty());
    }

    #[test]
    fn test_empty_stub_list_makes_no_requests() {
        let transport = ScriptedTransport::new();
        let enrichment = enrich_all(&transport, &endpoint(), Vec::new());
        assert!(enrichment.records.is_empty());
        assert_eq!(transport.call_count(), 0);
    }
}
