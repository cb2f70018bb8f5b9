//! Refresh Worker
//!
//! Consumes refresh jobs from `WORKER_QUEUE` until Ctrl-C, then drains
//! in-flight jobs.
//!
//! Run with: cargo run --example worker

use content_feeder::AppContext;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let ctx = AppContext::from_env().await?;
    if !ctx.health_check().await {
        anyhow::bail!("cache backend is not healthy");
    }

    let worker = ctx.worker_pool().start();
    tracing::info!(queue = %ctx.config().worker_queue, "Worker running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    worker.stop().await;

    for stats in ctx.cache_stats() {
        tracing::info!(
            resource = stats.resource,
            sets = stats.sets,
            set_failures = stats.set_failures,
            "Refresh summary"
        );
    }
    Ok(())
}
