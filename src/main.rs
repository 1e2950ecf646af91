use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use tokio_util::sync::CancellationToken;

use airq_sampler::config::{Args, CycleTiming, SampleContext};
use airq_sampler::sampler::{Sampler, SystemClock};
use airq_sampler::sensor::Sds011Session;
use airq_sampler::sink::{InfluxSink, DEFAULT_INFLUX_PORT};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run().await {
        error!("{err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    // Validate timing before touching any hardware.
    let timing = CycleTiming::new(args.warmup, args.interval)
        .context("invalid sampling configuration")?;
    let context = SampleContext::new(&args.measurement, &args.location, &args.geohash);

    let sensor = Sds011Session::open(&args.port)
        .with_context(|| format!("failed to connect to SDS011 on {}", args.port))?;
    let sink = InfluxSink::new(&args.influx, DEFAULT_INFLUX_PORT);

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            signal_token.cancel();
        }
    });

    Sampler::new(sensor, sink, SystemClock, context, timing, args.database)
        .run(cancel)
        .await
        .context("sampling stopped on a sensor failure")?;
    Ok(())
}
