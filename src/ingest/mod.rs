/// Clients for the three SOS requests the dashboard issues.
///
/// - `capabilities`: GetCapabilities → list of procedures.
/// - `describe`: DescribeSensor per procedure, strictly one at a time.
/// - `observations`: GetObservation → decoded readings.
///
/// `http` holds the endpoint description and the transport seam; `xml`
/// the exact-tag element lookup all three parsers share.

pub mod capabilities;
pub mod describe;
pub mod http;
pub mod observations;
pub mod xml;

#[cfg(test)]
pub(crate) mod fixtures;

pub use http::{SosEndpoint, SosTransport};
