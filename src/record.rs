//! Measurement records and the pure encoder that builds them from raw
//! sensor readings.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use thiserror::Error;

use crate::config::SampleContext;

/// One successful sensor read, in µg/m³. Produced by a single query and
/// consumed immediately; never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawReading {
    pub pm2_5: f64,
    pub pm10: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum EncodeError {
    #[error("non-finite {field} value ({value}) in sensor reading")]
    NonFinite { field: &'static str, value: f64 },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecordTags {
    pub sensor: String,
    pub location: String,
    pub geohash: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct RecordFields {
    pub pm25: f64,
    pub pm100: f64,
}

/// Storage-ready data point: measurement name, indexed tags, the timestamp
/// captured when the query began, and the numeric payload. Immutable once
/// built; only ever constructed from a complete [`RawReading`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MeasurementRecord {
    pub measurement: String,
    pub tags: RecordTags,
    pub time: DateTime<FixedOffset>,
    pub fields: RecordFields,
}

impl MeasurementRecord {
    /// Encodes a raw reading into a record. Pure; fails on non-finite
    /// values so a broken reading never reaches storage.
    pub fn from_reading(
        time: DateTime<FixedOffset>,
        context: &SampleContext,
        reading: RawReading,
    ) -> Result<Self, EncodeError> {
        for (field, value) in [("pm2_5", reading.pm2_5), ("pm10", reading.pm10)] {
            if !value.is_finite() {
                return Err(EncodeError::NonFinite { field, value });
            }
        }

        Ok(Self {
            measurement: context.measurement_name.clone(),
            tags: RecordTags {
                sensor: context.sensor_tag.clone(),
                location: context.location_tag.clone(),
                geohash: context.geohash_tag.clone(),
            },
            time,
            fields: RecordFields {
                pm25: reading.pm2_5,
                pm100: reading.pm10,
            },
        })
    }

    /// Renders the record as one InfluxDB line protocol entry with a
    /// millisecond timestamp.
    pub fn to_line_protocol(&self) -> String {
        format!(
            "{},sensor={},location={},geohash={} pm25={},pm100={} {}",
            escape_measurement(&self.measurement),
            escape_tag_value(&self.tags.sensor),
            escape_tag_value(&self.tags.location),
            escape_tag_value(&self.tags.geohash),
            self.fields.pm25,
            self.fields.pm100,
            self.time.timestamp_millis(),
        )
    }
}

fn escape_tag_value(value: &str) -> String {
    value
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

fn escape_measurement(value: &str) -> String {
    value.replace(',', "\\,").replace(' ', "\\ ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> SampleContext {
        SampleContext::new("aq", "home", "gbsuv7s")
    }

    fn timestamp() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00+02:00").unwrap()
    }

    #[test]
    fn fields_pass_through_exactly() {
        let record = MeasurementRecord::from_reading(
            timestamp(),
            &context(),
            RawReading {
                pm2_5: 12.3,
                pm10: 34.5,
            },
        )
        .unwrap();

        assert_eq!(record.fields.pm25, 12.3);
        assert_eq!(record.fields.pm100, 34.5);
        assert_eq!(record.measurement, "aq");
        assert_eq!(record.tags.sensor, "sds011");
        assert_eq!(record.tags.location, "home");
        assert_eq!(record.tags.geohash, "gbsuv7s");
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let nan = MeasurementRecord::from_reading(
            timestamp(),
            &context(),
            RawReading {
                pm2_5: f64::NAN,
                pm10: 34.5,
            },
        );
        assert!(matches!(
            nan,
            Err(EncodeError::NonFinite { field: "pm2_5", .. })
        ));

        let inf = MeasurementRecord::from_reading(
            timestamp(),
            &context(),
            RawReading {
                pm2_5: 12.3,
                pm10: f64::INFINITY,
            },
        );
        assert!(matches!(
            inf,
            Err(EncodeError::NonFinite { field: "pm10", .. })
        ));
    }

    #[test]
    fn serializes_to_the_documented_wire_shape() {
        let record = MeasurementRecord::from_reading(
            timestamp(),
            &context(),
            RawReading {
                pm2_5: 12.3,
                pm10: 34.5,
            },
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "measurement": "aq",
                "tags": {
                    "sensor": "sds011",
                    "location": "home",
                    "geohash": "gbsuv7s",
                },
                "time": "2024-05-01T12:00:00+02:00",
                "fields": {
                    "pm25": 12.3,
                    "pm100": 34.5,
                },
            })
        );
    }

    #[test]
    fn line_protocol_includes_tags_fields_and_millisecond_timestamp() {
        let record = MeasurementRecord::from_reading(
            timestamp(),
            &context(),
            RawReading {
                pm2_5: 12.3,
                pm10: 34.5,
            },
        )
        .unwrap();

        let millis = timestamp().timestamp_millis();
        assert_eq!(
            record.to_line_protocol(),
            format!("aq,sensor=sds011,location=home,geohash=gbsuv7s pm25=12.3,pm100=34.5 {millis}")
        );
    }

    #[test]
    fn line_protocol_escapes_tag_values() {
        let context = SampleContext::new("air quality", "living room", "gbsuv7s");
        let record = MeasurementRecord::from_reading(
            timestamp(),
            &context,
            RawReading {
                pm2_5: 1.0,
                pm10: 2.0,
            },
        )
        .unwrap();

        let line = record.to_line_protocol();
        assert!(line.starts_with("air\\ quality,sensor=sds011,location=living\\ room,"));
    }
}
