//! Sensor Observation Service (SOS) dashboard core.
//!
//! Lists the sensors of an istSOS instance, enriches each with its
//! SensorML details one request at a time, and retrieves and decodes
//! time-series readings for a selected sensor.

pub mod config;
pub mod display;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod sensors;
pub mod state;
pub mod time_codec;
