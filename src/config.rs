//! Startup configuration: CLI surface, per-run sample context and the
//! timing relationship between warm-up and sample interval.

use std::time::Duration;

use clap::Parser;
use thiserror::Error;

/// Tag value identifying the sensor model on every record.
pub const SENSOR_TAG: &str = "sds011";

pub const DEFAULT_MEASUREMENT: &str = "aq";
pub const DEFAULT_LOCATION: &str = "home";
pub const DEFAULT_GEOHASH: &str = "gbsuv7s";

#[derive(Parser, Debug)]
#[command(
    name = "airq-sampler",
    about = "Reads SDS011 sensor data and writes it to an InfluxDB instance"
)]
pub struct Args {
    /// SDS011 serial port
    #[arg(short, long, default_value = "/dev/ttyS0")]
    pub port: String,

    /// InfluxDB host
    #[arg(short, long, default_value = "localhost")]
    pub influx: String,

    /// InfluxDB database
    #[arg(short, long, default_value = "pistation")]
    pub database: String,

    /// InfluxDB measurement for sds011 data
    #[arg(short = 's', long, default_value = DEFAULT_MEASUREMENT)]
    pub measurement: String,

    /// InfluxDB tag for location
    #[arg(short, long, default_value = DEFAULT_LOCATION)]
    pub location: String,

    /// InfluxDB tag for geohash
    #[arg(short, long, default_value = DEFAULT_GEOHASH)]
    pub geohash: String,

    /// Warmup period for the sensor, in seconds
    #[arg(short, long, default_value_t = 20)]
    pub warmup: u64,

    /// Sample interval, in seconds
    #[arg(short = 'v', long, default_value_t = 60)]
    pub interval: u64,
}

/// Tag and measurement metadata captured once at startup. Empty values fall
/// back to the defaults above rather than failing.
#[derive(Debug, Clone)]
pub struct SampleContext {
    pub measurement_name: String,
    pub location_tag: String,
    pub geohash_tag: String,
    pub sensor_tag: String,
}

impl SampleContext {
    pub fn new(measurement: &str, location: &str, geohash: &str) -> Self {
        Self {
            measurement_name: non_empty_or(measurement, DEFAULT_MEASUREMENT),
            location_tag: non_empty_or(location, DEFAULT_LOCATION),
            geohash_tag: non_empty_or(geohash, DEFAULT_GEOHASH),
            sensor_tag: SENSOR_TAG.to_string(),
        }
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("sample interval ({interval}s) must be longer than the warmup period ({warmup}s)")]
    IntervalTooShort { warmup: u64, interval: u64 },
}

/// Validated cycle timing. The idle wait between cycles is
/// `interval - warmup`, so the interval must be strictly longer than the
/// warm-up or the loop could never hold its cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTiming {
    warmup: Duration,
    idle: Duration,
}

impl CycleTiming {
    pub fn new(warmup_seconds: u64, interval_seconds: u64) -> Result<Self, ConfigError> {
        if interval_seconds <= warmup_seconds {
            return Err(ConfigError::IntervalTooShort {
                warmup: warmup_seconds,
                interval: interval_seconds,
            });
        }
        Ok(Self {
            warmup: Duration::from_secs(warmup_seconds),
            idle: Duration::from_secs(interval_seconds - warmup_seconds),
        })
    }

    /// Dead time after waking the sensor before a reading is reliable.
    pub fn warmup(&self) -> Duration {
        self.warmup
    }

    /// Wait between putting the sensor to sleep and the next wake.
    pub fn idle(&self) -> Duration {
        self.idle
    }
}
