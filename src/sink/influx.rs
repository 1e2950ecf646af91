//! InfluxDB v1 write adapter: renders records as line protocol and posts
//! them to the `/write` endpoint.

use log::debug;

use super::{MeasurementSink, WriteError};
use crate::record::MeasurementRecord;

pub const DEFAULT_INFLUX_PORT: u16 = 8086;

pub struct InfluxSink {
    client: reqwest::Client,
    write_url: String,
}

impl InfluxSink {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            client: reqwest::Client::new(),
            write_url: format!("http://{host}:{port}/write"),
        }
    }
}

impl MeasurementSink for InfluxSink {
    async fn write(&self, records: &[MeasurementRecord], target: &str) -> Result<(), WriteError> {
        let body = records
            .iter()
            .map(MeasurementRecord::to_line_protocol)
            .collect::<Vec<_>>()
            .join("\n");
        debug!("writing {} record(s) to {target}", records.len());

        let response = self
            .client
            .post(&self.write_url)
            .query(&[("db", target), ("precision", "ms")])
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WriteError::Rejected { status, body });
        }
        Ok(())
    }
}
