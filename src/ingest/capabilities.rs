/// GetCapabilities client.
///
/// Lists the procedures (sensors) an SOS instance offers. Only the
/// `xlink:href` of each `sos:procedure` element is read; everything else in
/// the capabilities document is ignored.

use reqwest::Url;

use crate::ingest::http::{SosEndpoint, SosTransport};
use crate::ingest::xml::XmlDocument;
use crate::logging::{self, Operation};
use crate::model::{SensorStub, SosError};

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

pub fn build_capabilities_url(endpoint: &SosEndpoint) -> Result<Url, SosError> {
    endpoint.request_url(&[("service", "SOS"), ("request", "GetCapabilities")])
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Extracts one `SensorStub` per `sos:procedure` in document order.
///
/// Procedures with a missing or empty `xlink:href` are skipped, as are
/// repeats of an id already seen.
///
/// # Errors
/// - `SosError::ParseError`: the body is not well-formed XML.
/// - `SosError::DataError`: the service answered with an exception report.
pub fn parse_capabilities(xml: &str) -> Result<Vec<SensorStub>, SosError> {
    let doc = XmlDocument::parse(xml)?;
    if let Some(message) = doc.exception_report() {
        return Err(SosError::DataError(message));
    }

    let mut stubs: Vec<SensorStub> = Vec::new();
    for procedure in doc.elements_by_tag("sos:procedure") {
        let id = match procedure.attribute("xlink:href") {
            Some(id) if !id.is_empty() => id,
            _ => continue,
        };
        if stubs.iter().any(|s| s.id == id) {
            logging::debug(Operation::GetCapabilities, Some(id), "duplicate procedure skipped");
            continue;
        }
        stubs.push(SensorStub::new(id));
    }

    Ok(stubs)
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

/// Issues GetCapabilities and returns the listed sensors.
///
/// A failure here ends the refresh: it is logged and handed back to the
/// caller to show.
pub fn fetch_capabilities(
    transport: &dyn SosTransport,
    endpoint: &SosEndpoint,
) -> Result<Vec<SensorStub>, SosError> {
    let result = build_capabilities_url(endpoint)
        .and_then(|url| {
            logging::debug(Operation::GetCapabilities, None, &format!("GET {}", url));
            transport.get_text(&url)
        })
        .and_then(|body| parse_capabilities(&body));

    match result {
        Ok(stubs) => {
            logging::info(
                Operation::GetCapabilities,
                None,
                &format!("{} sensors listed by {}", stubs.len(), endpoint.server_url),
            );
            Ok(stubs)
        }
        Err(e) => {
            logging::log_sos_failure(Operation::GetCapabilities, None, &e);
            Err(e)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
