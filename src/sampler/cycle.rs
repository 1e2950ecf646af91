use std::time::Duration;

use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use super::clock::Clock;
use crate::config::{CycleTiming, SampleContext};
use crate::record::MeasurementRecord;
use crate::sensor::{SensorError, SensorSession};
use crate::sink::MeasurementSink;

#[derive(PartialEq)]
enum Hold {
    Elapsed,
    Cancelled,
}

/// Drives one sensor through the wake → warm-up → query → sleep → write
/// cadence until cancelled.
///
/// The sampler owns its sensor, sink and clock outright; there is no shared
/// state behind it and no concurrency within it — every cycle runs to
/// completion before the next one starts.
pub struct Sampler<S, K, C> {
    sensor: S,
    sink: K,
    clock: C,
    context: SampleContext,
    timing: CycleTiming,
    target: String,
}

impl<S, K, C> Sampler<S, K, C>
where
    S: SensorSession,
    K: MeasurementSink,
    C: Clock,
{
    pub fn new(
        sensor: S,
        sink: K,
        clock: C,
        context: SampleContext,
        timing: CycleTiming,
        target: String,
    ) -> Self {
        Self {
            sensor,
            sink,
            clock,
            context,
            timing,
            target,
        }
    }

    /// Runs cycles until `cancel` fires, then puts the sensor to sleep one
    /// final time on a best-effort basis. A hard sensor error ends the run
    /// early with the same best-effort sleep; the error is returned so the
    /// caller can exit non-zero.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), SensorError> {
        info!("warming up SDS011...");
        let outcome = self.run_cycles(&cancel).await;

        info!("pushing sensor into sleep state...");
        if let Err(err) = self.sensor.sleep().await {
            warn!("failed to put sensor to sleep during shutdown: {err}");
        }

        match &outcome {
            Ok(()) => info!("done"),
            Err(err) => error!("sampling stopped on sensor failure: {err}"),
        }
        outcome
    }

    /// Loop body; `Ok(())` means the token fired between phases.
    async fn run_cycles(&mut self, cancel: &CancellationToken) -> Result<(), SensorError> {
        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            // Do not assume the sensor is still asleep from the previous
            // cycle; waking an active sensor is harmless.
            self.sensor.wake().await?;

            // Dead time while the fan clears the chamber. Readings taken
            // earlier than this are unreliable, so nothing overlaps it.
            if self.hold(cancel, self.timing.warmup()).await == Hold::Cancelled {
                return Ok(());
            }

            let batch = self.acquire().await?;

            if !batch.is_empty() {
                if let Err(err) = self.sink.write(&batch, &self.target).await {
                    // A dropped sample is preferable to stalling the cadence.
                    error!(
                        "dropping {} record(s) after failed write to {}: {err}",
                        batch.len(),
                        self.target
                    );
                }
            }

            if self.hold(cancel, self.timing.idle()).await == Hold::Cancelled {
                return Ok(());
            }
        }
    }

    /// One query-to-sleep acquisition. The timestamp is captured at the
    /// moment the query begins, and the sensor goes back to sleep no matter
    /// how the query went, so a bad cycle never leaves it running.
    async fn acquire(&mut self) -> Result<Vec<MeasurementRecord>, SensorError> {
        let timestamp = self.clock.now();
        let queried = self.sensor.query().await;
        let slept = self.sensor.sleep().await;

        let mut batch = Vec::new();
        match queried {
            Ok(Some(reading)) => {
                match MeasurementRecord::from_reading(timestamp, &self.context, reading) {
                    Ok(record) => {
                        info!("SDS011: PM2.5 {}; PM10 {}", reading.pm2_5, reading.pm10);
                        batch.push(record);
                    }
                    Err(err) => warn!("discarding unusable reading: {err}"),
                }
            }
            Ok(None) => warn!("no response from SDS011 sensor"),
            Err(err) => return Err(err),
        }

        if let Err(err) = slept {
            warn!("failed to put sensor to sleep: {err}");
        }

        Ok(batch)
    }

    /// Waits for `duration` unless the token fires first.
    async fn hold(&self, cancel: &CancellationToken, duration: Duration) -> Hold {
        tokio::select! {
            _ = cancel.cancelled() => Hold::Cancelled,
            _ = self.clock.sleep(duration) => Hold::Elapsed,
        }
    }
}
