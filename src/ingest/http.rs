/// HTTP plumbing shared by the three SOS requests.
///
/// Every request is a single GET against the endpoint with the SOS
/// key/value parameters in the query string. There are no retries.

use std::time::Duration;

use reqwest::Url;

use crate::model::SosError;

/// istSOS instance path the dashboard was deployed against.
pub const DEFAULT_SERVICE_PATH: &str = "/istsos/vipul";

/// Offering used for GetObservation requests.
pub const DEFAULT_OFFERING: &str = "temporary";

/// Where the SOS service lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SosEndpoint {
    /// Scheme + host (+ port), e.g. `http://localhost:8080`.
    pub server_url: String,
    /// Path of the SOS instance on that server.
    pub service_path: String,
    pub offering: String,
}

impl SosEndpoint {
    pub fn new(server_url: &str) -> Self {
        Self {
            server_url: server_url.to_string(),
            service_path: DEFAULT_SERVICE_PATH.to_string(),
            offering: DEFAULT_OFFERING.to_string(),
        }
    }

    /// Builds the request URL with the given query parameters, in order.
    pub fn request_url(&self, params: &[(&str, &str)]) -> Result<Url, SosError> {
        let server = self.server_url.trim();
        if server.is_empty() {
            return Err(SosError::ValidationError(
                "Please enter a server URL".to_string(),
            ));
        }

        let base = format!(
            "{}/{}",
            server.trim_end_matches('/'),
            self.service_path.trim_start_matches('/')
        );
        Url::parse_with_params(&base, params).map_err(|e| {
            SosError::ValidationError(format!("Invalid server URL {:?}: {}", server, e))
        })
    }
}

/// A way of performing one GET and returning the body as text.
///
/// Non-2xx responses must map to `SosError::HttpError(status)` and
/// failures to obtain a response at all to `SosError::RequestFailed`.
pub trait SosTransport {
    fn get_text(&self, url: &Url) -> Result<String, SosError>;
}

impl SosTransport for reqwest::blocking::Client {
    fn get_text(&self, url: &Url) -> Result<String, SosError> {
        let response = self
            .get(url.clone())
            .header("Accept", "text/xml, application/xml")
            .send()
            .map_err(|e| SosError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SosError::HttpError(response.status().as_u16()));
        }

        response
            .text()
            .map_err(|e| SosError::RequestFailed(format!("failed to read response body: {}", e)))
    }
}

/// Builds the blocking client used against the endpoint.
pub fn build_client(timeout_secs: u64) -> Result<reqwest::blocking::Client, SosError> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| SosError::RequestFailed(format!("failed to create HTTP client: {}", e)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
