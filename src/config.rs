/// Configuration for the SOS dashboard.
///
/// Read from a TOML file (default `sos_dashboard.toml`), then overridden
/// by environment variables, which may come from a `.env` file:
///
/// | Variable           | Overrides              |
/// |--------------------|------------------------|
/// | `SOS_SERVER_URL`   | `server.url`           |
/// | `SOS_SERVICE_PATH` | `server.service_path`  |
/// | `SOS_OFFERING`     | `server.offering`      |
/// | `SOS_LOG_LEVEL`    | `logging.level`        |

use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::ingest::http::{SosEndpoint, DEFAULT_OFFERING, DEFAULT_SERVICE_PATH};
use crate::logging::LogLevel;
use crate::time_codec::TimeCodec;

pub const DEFAULT_CONFIG_PATH: &str = "sos_dashboard.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub time: TimeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub url: String,
    pub service_path: String,
    pub offering: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost".to_string(),
            service_path: DEFAULT_SERVICE_PATH.to_string(),
            offering: DEFAULT_OFFERING.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Offset of the service's local zone from UTC. 330 = IST.
    pub utc_offset_minutes: i64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self { utc_offset_minutes: 330 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            timestamps: false,
        }
    }
}

impl Config {
    pub fn endpoint(&self) -> SosEndpoint {
        SosEndpoint {
            server_url: self.server.url.clone(),
            service_path: self.server.service_path.clone(),
            offering: self.server.offering.clone(),
        }
    }

    pub fn codec(&self) -> TimeCodec {
        TimeCodec::with_offset_minutes(self.time.utc_offset_minutes)
    }

    /// Configured level, falling back to Info for unrecognised names.
    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_name(&self.logging.level).unwrap_or(LogLevel::Info)
    }
}

/// Parses configuration TOML. Missing sections and keys take defaults.
pub fn parse_config(text: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(text)
}

/// Loads the configuration file and applies environment overrides.
///
/// An explicitly given path must exist; the default path is optional.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn Error>> {
    dotenv::dotenv().ok();

    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
            parse_config(&text)
                .map_err(|e| format!("Failed to parse config {}: {}", path.display(), e))?
        }
        None => match fs::read_to_string(DEFAULT_CONFIG_PATH) {
            Ok(text) => parse_config(&text)
                .map_err(|e| format!("Failed to parse config {}: {}", DEFAULT_CONFIG_PATH, e))?,
            Err(_) => Config::default(),
        },
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies `SOS_*` overrides from `lookup`. Empty values are ignored.
pub fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get("SOS_SERVER_URL") {
        config.server.url = url;
    }
    if let Some(path) = get("SOS_SERVICE_PATH") {
        config.server.service_path = path;
    }
    if let Some(offering) = get("SOS_OFFERING") {
        config.server.offering = offering;
    }
    if let Some(level) = get("SOS_LOG_LEVEL") {
        config.logging.level = level;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
