//! The sample-acquisition cycle: a fixed cadence of wake → warm-up →
//! query → sleep → write, repeated until cancelled.

mod clock;
mod cycle;

pub use clock::{Clock, SystemClock};
pub use cycle::Sampler;
