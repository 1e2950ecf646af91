use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local};

/// Time source for the sampling cycle, injected so tests can run cycles
/// without real waiting.
pub trait Clock {
    /// Wall-clock time with the local UTC offset, used to stamp records.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Suspends the cycle for `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

/// Tokio-backed clock used outside of tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
