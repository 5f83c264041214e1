//! worker — pops work items and writes result files until interrupted.

use clap::Parser;
use std::time::Duration;
use workpipe::config::Config;
use workpipe::consumer::Consumer;
use workpipe::queue::{DEFAULT_QUEUE, RedisQueue};
use workpipe::telemetry::{TelemetryConfig, init_telemetry};

#[derive(Parser)]
#[command(name = "worker", about = "Consume work items and write result files")]
struct Cli {
    /// Queue to consume from
    #[arg(long, default_value = DEFAULT_QUEUE)]
    queue: String,
    /// Seconds each pop waits before checking for shutdown (0 = wait forever)
    #[arg(long, default_value_t = 1)]
    poll_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;
    let result_root = config.result_folder()?.to_path_buf();

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "worker".to_string(),
        log_level: config.log_level.clone(),
    })?;

    let store = RedisQueue::connect(&config.store).await.inspect_err(|e| {
        tracing::error!(error = %e, "worker could not reach the queue store");
    })?;

    let poll = (cli.poll_secs > 0).then(|| Duration::from_secs(cli.poll_secs));
    let consumer = Consumer::new(store, cli.queue, result_root).with_poll_interval(poll);

    let shutdown = consumer.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.trigger();
        }
    });

    consumer.start().await?;
    Ok(())
}
