/// Conversion between the local date/time fields a user works with and the
/// UTC wire timestamps the SOS endpoint speaks.
///
/// The service sits in a fixed offset zone (IST, +05:30 by default). All
/// offset arithmetic is done in milliseconds so that encoding and decoding
/// are exact inverses:
///
///   wire  = local - offset      (`adjust_to_utc`)
///   local = wire  + offset      (`to_local_fields`, `parse_time_interval`)

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::logging::{self, Operation};
use crate::model::{SosError, TimeRange};

/// 5.5 hours expressed in milliseconds (5.5 × 3600 × 1000).
pub const IST_OFFSET_MS: i64 = 19_800_000;

/// Wire format for GetObservation `eventTime` bounds.
const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeCodec {
    offset_ms: i64,
}

impl Default for TimeCodec {
    fn default() -> Self {
        Self { offset_ms: IST_OFFSET_MS }
    }
}

impl TimeCodec {
    pub fn with_offset_minutes(minutes: i64) -> Self {
        Self { offset_ms: minutes * 60 * 1000 }
    }

    pub fn offset_ms(&self) -> i64 {
        self.offset_ms
    }

    fn offset(&self) -> Duration {
        Duration::milliseconds(self.offset_ms)
    }

    /// Splits a `swe:interval` string ("<start> <end>") into local date and
    /// time fields.
    ///
    /// Empty or blank input, or any parse failure, yields the default range
    /// (`""`, `00:00`, `""`, `23:59`). Failures are logged, never returned.
    pub fn parse_time_interval(&self, text: Option<&str>) -> TimeRange {
        let text = match text {
            Some(t) if !t.trim().is_empty() => t,
            _ => return TimeRange::default(),
        };

        match self.try_parse_interval(text) {
            Ok(range) => range,
            Err(e) => {
                logging::warn(
                    Operation::TimeCodec,
                    None,
                    &format!("Error parsing time interval {:?}: {}", text, e),
                );
                TimeRange::default()
            }
        }
    }

    fn try_parse_interval(&self, text: &str) -> Result<TimeRange, SosError> {
        let mut parts = text.split_whitespace();
        let (start, end) = match (parts.next(), parts.next()) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(SosError::ParseError(
                    "expected two whitespace-separated timestamps".to_string(),
                ))
            }
        };

        let start = self.to_local(parse_wire_timestamp(start)?)?;
        let end = self.to_local(parse_wire_timestamp(end)?)?;

        Ok(TimeRange {
            start_date: start.format("%Y-%m-%d").to_string(),
            start_time: start.format("%H:%M:%S").to_string(),
            end_date: end.format("%Y-%m-%d").to_string(),
            end_time: end.format("%H:%M:%S").to_string(),
        })
    }

    /// Composes a local date (`YYYY-MM-DD`) and time (`HH:MM` or `HH:MM:SS`)
    /// into the UTC wire timestamp, e.g. `2023-06-03` + `20:00` →
    /// `2023-06-03T14:30:00Z`.
    pub fn adjust_to_utc(&self, date: &str, time: &str) -> Result<String, SosError> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|e| SosError::ValidationError(format!("Invalid date {:?}: {}", date, e)))?;
        let time = parse_clock(time.trim())
            .ok_or_else(|| SosError::ValidationError(format!("Invalid time {:?}", time)))?;

        let utc = NaiveDateTime::new(date, time)
            .checked_sub_signed(self.offset())
            .ok_or_else(|| {
                SosError::ValidationError(format!("Date {} {} is out of range", date, time))
            })?;
        Ok(utc.format(WIRE_FORMAT).to_string())
    }

    /// Converts a wire timestamp to local `(YYYY-MM-DD, HH:MM:SS)` fields.
    pub fn to_local_fields(&self, timestamp: &str) -> Result<(String, String), SosError> {
        let local = self.to_local(parse_wire_timestamp(timestamp)?)?;
        Ok((
            local.format("%Y-%m-%d").to_string(),
            local.format("%H:%M:%S").to_string(),
        ))
    }

    fn to_local(&self, utc: NaiveDateTime) -> Result<NaiveDateTime, SosError> {
        utc.checked_add_signed(self.offset())
            .ok_or_else(|| SosError::ParseError(format!("timestamp {} is out of range", utc)))
    }
}

fn parse_clock(time: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
        .ok()
}

/// Parses a timestamp from the service into naive UTC.
///
/// Accepts RFC 3339 (`...+05:30`, `...Z`), the colon-less offset variant
/// some istSOS versions emit (`...+0530`), and offset-less timestamps,
/// which are taken to be UTC already.
pub fn parse_wire_timestamp(raw: &str) -> Result<NaiveDateTime, SosError> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_utc());
    }

    if let Some(repaired) = insert_offset_colon(raw) {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&repaired) {
            return Ok(dt.naive_utc());
        }
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .map_err(|e| SosError::ParseError(format!("invalid timestamp {:?}: {}", raw, e)))
}

/// `2023-06-03T20:00:00+0530` → `2023-06-03T20:00:00+05:30`
fn insert_offset_colon(raw: &str) -> Option<String> {
    if raw.len() < 5 || !raw.is_char_boundary(raw.len() - 5) {
        return None;
    }
    let (head, offset) = raw.split_at(raw.len() - 5);
    let bytes = offset.as_bytes();
    let signed = bytes[0] == b'+' || bytes[0] == b'-';
    if signed && bytes[1..].iter().all(u8::is_ascii_digit) {
        Some(format!("{}{}:{}", head, &offset[..3], &offset[3..]))
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
