use bingo_relay::{RelayResult, ServerConfig, WebsocketServer};
use tracing::info;
use tracing::level_filters::LevelFilter;

#[tokio::main]
async fn main() -> RelayResult<()> {
    let level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = ServerConfig::from_env()?;
    info!("🎱 Starting bingo relay on {}", config.address());

    let server = WebsocketServer::bind(config).await?;
    server.run().await
}
