//! Agenda insights server binary
//!
//! Run with: cargo run -p agenda-insights --bin agenda-insights-server

use agenda_insights::{config::AppConfig, server::InsightsServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agenda_insights=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path =
        std::env::var("AGENDA_INSIGHTS_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let config = AppConfig::from_file(&config_path)?;

    tracing::info!("Configuration loaded from {}", config_path);
    tracing::info!("  - Model deployment: {}", config.model.deployment);
    tracing::info!("  - Source tenant: {}", config.source.tenant_domain);
    tracing::info!("  - Locations configured: {}", config.locations.len());
    tracing::info!("  - Database: {}", config.database.path.display());

    // Create and start server
    let server = InsightsServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/process  - Process one agenda document");
    println!("  GET  /api/insights - List persisted records");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
