use poem::Server;
use poem::listener::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use forum::config::ForumConfig;
use forum::context::ForumContext;
use forum::{build_app, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ForumConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();
    tokio::fs::create_dir_all(&config.avatar_dir).await?;

    let ctx = ForumContext::connect(config).await?;
    seed::ensure_default_category(&ctx).await?;

    info!(%bind_addr, "forum listening");
    Server::new(TcpListener::bind(bind_addr)).run(build_app(ctx)).await?;
    Ok(())
}
