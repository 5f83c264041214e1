//! master — pushes synthetic work items onto the queue.

use clap::Parser;
use std::time::Duration;
use workpipe::config::Config;
use workpipe::producer::Producer;
use workpipe::queue::{DEFAULT_QUEUE, RedisQueue};
use workpipe::telemetry::{TelemetryConfig, init_telemetry};

#[derive(Parser)]
#[command(name = "master", about = "Push work items onto the queue")]
struct Cli {
    /// Number of work items to push
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    iterations: u64,
    /// Queue to push to
    #[arg(long, default_value = DEFAULT_QUEUE)]
    queue: String,
    /// Seconds to pause between pushes
    #[arg(long, default_value_t = 1.0)]
    interval_secs: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "master".to_string(),
        log_level: config.log_level.clone(),
    })?;

    let interval = Duration::try_from_secs_f64(cli.interval_secs)
        .map_err(|e| anyhow::anyhow!("invalid --interval-secs {}: {e}", cli.interval_secs))?;

    let store = RedisQueue::connect(&config.store).await.inspect_err(|e| {
        tracing::error!(error = %e, "master could not reach the queue store");
    })?;

    let producer = Producer::new(store, cli.queue).with_interval(interval);
    producer.start(cli.iterations).await?;
    Ok(())
}
