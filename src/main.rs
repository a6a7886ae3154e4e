use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use canvasion::canvas::{CanvasConfig, CanvasHttpClient};
use canvasion::notion::{NotionClient, NotionConfig, NotionHttpClient, NoopNotionClient};
use canvasion::services::{SyncOptions, SyncService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "canvasion=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let canvas_config = CanvasConfig::new_from_env()?;
    let options = SyncOptions::new_from_env()?;

    let canvas = Arc::new(CanvasHttpClient::new(canvas_config)?);

    let dry_run = std::env::var("DRY_RUN")
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);

    let notion: Arc<dyn NotionClient> = if dry_run {
        info!("DRY_RUN set, Notion writes disabled");
        Arc::new(NoopNotionClient)
    } else {
        let notion_config = NotionConfig::new_from_env()?;
        Arc::new(NotionHttpClient::new(notion_config)?)
    };

    let service = SyncService::new(canvas, notion, options);
    let result = service.run().await?;

    for failure in &result.failures {
        warn!(
            "Failure ({:?}) for {}: {}",
            failure.kind, failure.id, failure.message
        );
    }
    info!(
        "Run finished: {} fetched, {} filtered out, {} written, {} failures",
        result.fetched,
        result.filtered_out,
        result.written,
        result.failures.len()
    );

    Ok(())
}
