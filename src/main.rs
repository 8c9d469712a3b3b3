/// VidTube - video sharing backend
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidtube::{config::ServerConfig, context::AppContext, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first so RUST_LOG from .env reaches the filter
    let config = ServerConfig::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidtube=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(level = %config.logging.level, "Starting VidTube v{}", env!("CARGO_PKG_VERSION"));

    let ctx = AppContext::new(config).await?;

    server::serve(ctx).await?;

    Ok(())
}
