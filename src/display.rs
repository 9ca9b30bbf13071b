/// Plain-text rendering of sensors and readings for the command line.

use crate::model::{bare_name, BoundingBox, Reading, SensorRecord};

const LABEL_DESCRIPTION_CHARS: usize = 30;

/// Short property name: `urn:...:meteo:air:rainfall` → `rainfall`.
pub fn measured_property(sensor: &SensorRecord) -> &str {
    bare_name(&sensor.observed_property)
}

/// One-line label: name plus the first 30 characters of the description.
pub fn sensor_label(sensor: &SensorRecord) -> String {
    let mut chars = sensor.description.chars();
    let head: String = chars.by_ref().take(LABEL_DESCRIPTION_CHARS).collect();
    let ellipsis = if chars.next().is_some() { "..." } else { "" };
    format!("{} - {}{}", sensor.name, head, ellipsis)
}

/// `12.9716°N, 77.5667°E`, or a note when the sensor has no coordinates.
pub fn format_location(coordinates: Option<(f64, f64)>) -> String {
    match coordinates {
        Some((lon, lat)) => format!("{:.4}°N, {:.4}°E", lat, lon),
        None => "not reported".to_string(),
    }
}

/// Multi-line summary of one sensor's details.
pub fn sensor_summary(sensor: &SensorRecord) -> String {
    format!(
        "{}\n  Description:   {}\n  Measures:      {}\n  Type:          {}\n  Time Interval: {}\n  Location:      {}",
        sensor.name,
        sensor.description,
        measured_property(sensor),
        sensor.sensor_type,
        sensor.time_interval,
        format_location(sensor.coordinates),
    )
}

pub fn format_bbox(bbox: &BoundingBox) -> String {
    format!(
        "lon {:.4} .. {:.4}, lat {:.4} .. {:.4}",
        bbox.min_lon, bbox.max_lon, bbox.min_lat, bbox.max_lat
    )
}

/// Date / Time / Value table, values to two decimals.
pub fn readings_table(sensor: &SensorRecord, readings: &[Reading]) -> String {
    if readings.is_empty() {
        return "No readings found.".to_string();
    }

    let mut out = format!("{} - {}\n", sensor.name, measured_property(sensor));
    out.push_str(&format!("{:<12} {:<10} {:>12}\n", "Date", "Time", "Value"));
    for r in readings {
        out.push_str(&format!("{:<12} {:<10} {:>12.2}\n", r.date, r.time, r.value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SensorStub;

    fn rain() -> SensorRecord {
        let mut s = SensorRecord::from_stub(SensorStub::new("urn:x:RAIN_BLR"));
        s.description = "Tipping bucket rain gauge on the IISc campus roof".to_string();
        s.observed_property = "urn:ogc:def:parameter:x-istsos:1.0:meteo:air:rainfall".to_string();
        s
    }

    #[test]
    fn test_label_truncates_long_descriptions() {
        assert_eq!(sensor_label(&rain()), "RAIN_BLR - Tipping bucket rain gauge on t...");

        let mut short = rain();
        short.description = "Rain gauge".to_string();
        assert_eq!(sensor_label(&short), "RAIN_BLR - Rain gauge");
    }

    #[test]
    fn test_summary_without_coordinates_does_not_panic() {
        let summary = sensor_summary(&rain());
        assert!(summary.contains("Location:      not reported"));
        assert!(summary.contains("Measures:      rainfall"));
    }

    #[test]
    fn test_location_is_lat_first() {
        assert_eq!(format_location(Some((77.5667, 12.9716))), "12.9716°N, 77.5667°E");
    }

    #[test]
    fn test_readings_table() {
        let readings = vec![Reading {
            timestamp: "2023-06-03T14:30:00Z".to_string(),
            date: "2023-06-03".to_string(),
            time: "20:00:00".to_string(),
            value: 1.4,
        }];
        let table = readings_table(&rain(), &readings);
        assert!(table.starts_with("RAIN_BLR - rainfall\n"));
        assert!(table.contains("2023-06-03   20:00:00           1.40"));
        assert_eq!(readings_table(&rain(), &[]), "No readings found.");
    }
}
