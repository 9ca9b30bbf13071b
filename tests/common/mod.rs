//! Shared helpers for the integration tests: fixture loading and an
//! in-memory SOS transport.

#![allow(dead_code)]

use std::cell::RefCell;

use reqwest::Url;
use sos_dashboard::ingest::SosTransport;
use sos_dashboard::model::SosError;

pub const RAIN_ID: &str = "urn:ogc:def:procedure:x-istsos:1.0:RAIN_BLR";
pub const TEMP_ID: &str = "urn:ogc:def:procedure:x-istsos:1.0:TEMP_PUNE";
pub const HUM_ID: &str = "urn:ogc:def:procedure:x-istsos:1.0:HUM_DEL";

pub fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("missing fixture {}: {}", path, e))
}

pub fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

type Route = (String, Option<String>, Result<String, SosError>);

/// Answers by `request` and, when routed, `procedure`. Anything else is a 404.
#[derive(Default)]
pub struct FakeSos {
    routes: Vec<Route>,
    pub calls: RefCell<Vec<Url>>,
}

impl FakeSos {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, request: &str, procedure: Option<&str>, body: Result<String, SosError>) -> Self {
        self.routes.push((request.to_string(), procedure.map(String::from), body));
        self
    }

    /// The three-sensor istSOS instance from the fixtures.
    pub fn istsos() -> Self {
        Self::new()
            .on("GetCapabilities", None, Ok(fixture("capabilities.xml")))
            .on("DescribeSensor", Some(RAIN_ID), Ok(fixture("describe_rain.xml")))
            .on("DescribeSensor", Some(TEMP_ID), Err(SosError::HttpError(500)))
            .on("DescribeSensor", Some(HUM_ID), Ok(fixture("describe_no_coords.xml")))
            .on("GetObservation", None, Ok(fixture("observation.xml")))
    }

    pub fn requests(&self) -> Vec<(String, Option<String>)> {
        self.calls
            .borrow()
            .iter()
            .map(|url| (query_value(url, "request").unwrap_or_default(), query_value(url, "procedure")))
            .collect()
    }
}

impl SosTransport for FakeSos {
    fn get_text(&self, url: &Url) -> Result<String, SosError> {
        self.calls.borrow_mut().push(url.clone());
        let request = query_value(url, "request").unwrap_or_default();
        let procedure = query_value(url, "procedure");

        self.routes
            .iter()
            .find(|(r, p, _)| *r == request && (p.is_none() || *p == procedure))
            .map(|(_, _, body)| body.clone())
            .unwrap_or(Err(SosError::HttpError(404)))
    }
}
