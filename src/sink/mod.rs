//! Storage sink port: where finished measurement records go.

use std::future::Future;

use thiserror::Error;

use crate::record::MeasurementRecord;

mod influx;

pub use influx::{InfluxSink, DEFAULT_INFLUX_PORT};

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to reach storage backend: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("storage backend rejected the write ({status}): {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Destination for measurement records. One call per cycle batch; calls are
/// independent and carry no cross-cycle state. `target` names the dataset
/// (for InfluxDB, the database).
pub trait MeasurementSink {
    fn write(
        &self,
        records: &[MeasurementRecord],
        target: &str,
    ) -> impl Future<Output = Result<(), WriteError>>;
}
