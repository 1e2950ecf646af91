//! Sensor session port: the power-state and query surface the sampling
//! cycle needs, independent of the wire protocol behind it.

use std::future::Future;

use thiserror::Error;

use crate::record::RawReading;

mod sds011;

pub use sds011::Sds011Session;

/// Hard sensor failures. A transient read miss is *not* an error; it is
/// reported as `Ok(None)` from [`SensorSession::query`].
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("serial I/O failed during {action}: {source}")]
    Io {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// One physical sensor connection.
///
/// The session owns the underlying port for the life of the process and is
/// driven by exactly one task; there are never concurrent queries. State
/// machine: Sleeping → `wake` → Warming → (warm-up elapses) → Active →
/// `query` → Active | `sleep` → Sleeping.
pub trait SensorSession {
    /// Moves the sensor into its active, measuring state. Idempotent when
    /// the sensor is already awake.
    fn wake(&mut self) -> impl Future<Output = Result<(), SensorError>>;

    /// Requests one measurement. `Ok(None)` means the sensor produced no
    /// usable data this time (timeout, malformed frame); the cycle treats
    /// that as a gap, not a failure.
    fn query(&mut self) -> impl Future<Output = Result<Option<RawReading>, SensorError>>;

    /// Moves the sensor into its low-power state.
    fn sleep(&mut self) -> impl Future<Output = Result<(), SensorError>>;
}
