//! Creates the schema and loads the demo data: an admin account, starter
//! categories and tags, and a pinned welcome post.

use tracing_subscriber::EnvFilter;

use forum::config::ForumConfig;
use forum::context::ForumContext;
use forum::seed;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ForumConfig::from_env()?;
    let admin_password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_owned());
    let ctx = ForumContext::connect(config).await?;

    seed::ensure_default_category(&ctx).await?;
    let report = seed::init_demo_data(&ctx, &admin_password).await?;
    println!(
        "admin created: {}, categories created: {}, tags created: {}, welcome post created: {}",
        report.admin_created, report.categories_created, report.tags_created, report.welcome_post_created
    );
    Ok(())
}
