/// Structured logging for the SOS dashboard
///
/// Provides context-rich logging with SOS operation and procedure
/// identifiers, timestamps, and severity levels. Supports both console
/// output and file-based logging.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::SosError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl LogLevel {
    /// Parses a level name as written in config files ("debug", "warn", ...).
    pub fn from_name(name: &str) -> Option<LogLevel> {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Operation Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    GetCapabilities,
    DescribeSensor,
    GetObservation,
    TimeCodec,
    Config,
    System,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::GetCapabilities => write!(f, "CAPS"),
            Operation::DescribeSensor => write!(f, "DESC"),
            Operation::GetObservation => write!(f, "OBS"),
            Operation::TimeCodec => write!(f, "TIME"),
            Operation::Config => write!(f, "CFG"),
            Operation::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - the user left a field empty
    Expected,
    /// Unexpected failure - endpoint down, misconfigured, or returning garbage
    Unexpected,
    /// Unknown - the service answered but had nothing for us
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut global) = LOGGER.lock() {
            *global = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, operation: &Operation, procedure: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

        let procedure_part = procedure.map(|p| format!(" [{}]", p)).unwrap_or_default();
        let log_entry = format!(
            "{} {} {}{}: {}",
            timestamp,
            level,
            operation,
            procedure_part,
            message
        );

        // Console output goes to stderr so JSON on stdout stays clean
        if self.console_timestamps {
            eprintln!("{}", log_entry);
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", operation, procedure_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", operation, procedure_part, message),
                LogLevel::Info => eprintln!("   {}", message),
                LogLevel::Debug => eprintln!("   [DEBUG] {}", message),
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn emit(level: LogLevel, operation: Operation, procedure: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, &operation, procedure, message);
        }
    }
}

/// Log a general informational message
pub fn info(operation: Operation, procedure: Option<&str>, message: &str) {
    emit(LogLevel::Info, operation, procedure, message);
}

/// Log a warning message
pub fn warn(operation: Operation, procedure: Option<&str>, message: &str) {
    emit(LogLevel::Warning, operation, procedure, message);
}

/// Log an error message
pub fn error(operation: Operation, procedure: Option<&str>, message: &str) {
    emit(LogLevel::Error, operation, procedure, message);
}

/// Log a debug message
pub fn debug(operation: Operation, procedure: Option<&str>, message: &str) {
    emit(LogLevel::Debug, operation, procedure, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify an SOS failure by its error kind
pub fn classify_failure(err: &SosError) -> FailureType {
    match err {
        SosError::ValidationError(_) => FailureType::Expected,
        SosError::HttpError(_) | SosError::RequestFailed(_) | SosError::ParseError(_) => {
            FailureType::Unexpected
        }
        SosError::DataError(_) => FailureType::Unknown,
    }
}

/// Log an SOS failure with automatic classification
pub fn log_sos_failure(operation: Operation, procedure: Option<&str>, err: &SosError) {
    let failure_type = classify_failure(err);
    let message = format!("{} failed [{}]: {}", operation_label(&operation), failure_type, err);

    match failure_type {
        FailureType::Expected => debug(operation, procedure, &message),
        FailureType::Unexpected => error(operation, procedure, &message),
        FailureType::Unknown => warn(operation, procedure, &message),
    }
}

fn operation_label(operation: &Operation) -> &'static str {
    match operation {
        Operation::GetCapabilities => "GetCapabilities",
        Operation::DescribeSensor => "DescribeSensor",
        Operation::GetObservation => "GetObservation",
        Operation::TimeCodec => "Time conversion",
        Operation::Config => "Configuration",
        Operation::System => "Operation",
    }
}

// ---------------------------------------------------------------------------
// Batch Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a DescribeSensor batch
pub fn log_enrichment_summary(total: usize, successful: usize, located: usize) {
    let failed = total - successful;
    let message = format!(
        "Sensor details loaded: {}/{} successful, {} failed, {} with coordinates",
        successful,
        total,
        failed,
        located
    );

    if failed == 0 {
        info(Operation::DescribeSensor, None, &message);
    } else if successful == 0 {
        error(Operation::DescribeSensor, None, &message);
    } else {
        warn(Operation::DescribeSensor, None, &message);
    }
}
