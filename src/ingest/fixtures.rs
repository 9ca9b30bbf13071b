//! Canned istSOS responses and a scripted transport for unit tests.
//!
//! The XML files live in `tests/fixtures/` so integration tests can share
//! them.

use std::cell::RefCell;

use reqwest::Url;

use crate::ingest::http::SosTransport;
use crate::model::SosError;

/// Three usable procedures plus one empty and one missing `xlink:href`.
pub fn fixture_capabilities_xml() -> &'static str {
    include_str!("../../tests/fixtures/capabilities.xml")
}

/// RAIN_BLR: description, coordinates 77.5667,12.9716 (with altitude),
/// rainfall quantity, `+0530` interval, "Sensor Type" classifier.
pub fn fixture_describe_rain_xml() -> &'static str {
    include_str!("../../tests/fixtures/describe_rain.xml")
}

/// HUM_DEL: no description, unparseable coordinates, no interval, no classifier.
pub fn fixture_describe_no_coords_xml() -> &'static str {
    include_str!("../../tests/fixtures/describe_no_coords.xml")
}

/// Three rainfall readings, 14:30Z to 16:30Z.
pub fn fixture_observation_xml() -> &'static str {
    include_str!("../../tests/fixtures/observation.xml")
}

/// Well-formed collection without a `swe:values` node.
pub fn fixture_observation_empty_xml() -> &'static str {
    include_str!("../../tests/fixtures/observation_empty.xml")
}

pub fn fixture_exception_xml() -> &'static str {
    include_str!("../../tests/fixtures/exception.xml")
}

/// Answers by `request` (and `procedure`, when given) query parameter.
/// Unrouted requests get a 404. Every URL asked for is recorded.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Vec<(String, Option<String>, Result<String, SosError>)>,
    pub calls: RefCell<Vec<Url>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(
        mut self,
        request: &str,
        procedure: Option<&str>,
        response: Result<&str, SosError>,
    ) -> Self {
        self.routes.push((
            request.to_string(),
            procedure.map(String::from),
            response.map(String::from),
        ));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// `procedure` query values of every call, in order.
    pub fn procedures_requested(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|url| query_value(url, "procedure"))
            .collect()
    }
}

pub fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

impl SosTransport for ScriptedTransport {
    fn get_text(&self, url: &Url) -> Result<String, SosError> {
        self.calls.borrow_mut().push(url.clone());

        let request = query_value(url, "request").unwrap_or_default();
        let procedure = query_value(url, "procedure");

        self.routes
            .iter()
            .find(|(r, p, _)| *r == request && (p.is_none() || *p == procedure))
            .map(|(_, _, response)| response.clone())
            .unwrap_or(Err(SosError::HttpError(404)))
    }
}
