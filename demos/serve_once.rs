//! Serve One Request
//!
//! Runs the read path once per resource and prints what a transport layer
//! would answer, including the status code of errors.
//!
//! Run with: cargo run --example serve_once -- <title_id> <chapter>

use content_feeder::{AppContext, ServiceError, validation};
use tracing_subscriber::EnvFilter;

fn report<T: serde::Serialize>(label: &str, result: Result<T, ServiceError>) -> anyhow::Result<()> {
    match result {
        Ok(value) => println!("{label}: 200 {}", serde_json::to_string_pretty(&value)?),
        Err(e) => println!("{label}: {} {e}", e.status_code()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .init();

    let mut args = std::env::args().skip(1);
    let title_id = args.next();
    let chapter = args.next();

    let ctx = AppContext::from_env().await?;

    report("catalog", ctx.catalog_service().get_catalog().await)?;

    match validation::sub_list_request(title_id.as_deref()) {
        Ok(request) => report("chapters", ctx.sub_list_service().get_sub_list(&request).await)?,
        Err(e) => report::<()>("chapters", Err(e))?,
    }

    match validation::page_list_request(title_id.as_deref(), chapter.as_deref()) {
        Ok(request) => report("contents", ctx.page_list_service().get_page_list(&request).await)?,
        Err(e) => report::<()>("contents", Err(e))?,
    }

    for stats in ctx.cache_stats() {
        tracing::info!(resource = stats.resource, hit_rate = stats.hit_rate, "Cache stats");
    }
    Ok(())
}
