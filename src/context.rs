//! Everything a handler needs, built once at startup and passed in explicitly.

use std::sync::Arc;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::config::ForumConfig;
use crate::error::ForumError;
use crate::identity::Identity;
use crate::identity::session::SessionManager;
use crate::migration::Migrator;

#[derive(Clone)]
pub struct ForumContext {
    pub db: DatabaseConnection,
    pub config: Arc<ForumConfig>,
    pub sessions: SessionManager,
}

impl ForumContext {
    pub fn new(db: DatabaseConnection, config: ForumConfig) -> Self {
        let sessions = SessionManager::new(config.secret_key.as_bytes(), config.session_ttl, config.remember_ttl);
        Self { db, config: Arc::new(config), sessions }
    }

    /// Connects to `config.database_url` and brings the schema up to date.
    pub async fn connect(config: ForumConfig) -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new(config.database_url.clone());
        if config.database_url.contains(":memory:") {
            // Every connection to an in-memory SQLite database sees its own database.
            opt.max_connections(1).min_connections(1);
        } else {
            opt.max_connections(10).min_connections(1);
        }
        opt.connect_timeout(Duration::from_secs(8))
            .sqlx_logging(false);

        let db = Database::connect(opt).await?;
        Migrator::up(&db, None).await?;
        info!("database ready");
        Ok(Self::new(db, config))
    }

    /// Resolves a session token (if any) to an identity.
    pub async fn identify(&self, token: Option<&str>) -> Result<Identity, ForumError> {
        self.sessions.resolve(&self.db, token).await
    }
}
