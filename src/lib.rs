//! Continuous SDS011 air-quality sampler.
//!
//! The crate drives one particulate-matter sensor through a fixed cadence
//! (wake, warm-up, query, sleep), encodes each successful reading into a
//! tagged measurement record and hands it to a time-series sink. The cycle
//! logic lives in [`sampler`]; the sensor and storage backends are reached
//! through the traits in [`sensor`] and [`sink`] so the loop can be tested
//! against substitute implementations.

pub mod config;
pub mod record;
pub mod sampler;
pub mod sensor;
pub mod sink;
