use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use smartmenu_core::config::{AppConfig, ConfigError, LoadOptions};
use smartmenu_core::Catalog;
use smartmenu_db::{connect_with_settings, migrations, DbPool, OrderFeed, SqlOrderRepository};

use crate::api::ApiState;
use crate::voice::VoiceState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub catalog: Arc<Catalog>,
    pub order_feed: Arc<OrderFeed>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let repository = Arc::new(SqlOrderRepository::new(db_pool.clone()));
    let (order_feed, _poller) = OrderFeed::spawn(
        repository,
        Duration::from_secs(config.server.order_poll_secs),
    );

    Ok(Application {
        config,
        db_pool,
        catalog: Arc::new(Catalog::builtin()),
        order_feed: Arc::new(order_feed),
    })
}

impl Application {
    pub fn api_state(&self) -> ApiState {
        ApiState {
            catalog: self.catalog.clone(),
            orders: Arc::new(SqlOrderRepository::new(self.db_pool.clone())),
            feed: self.order_feed.clone(),
        }
    }

    pub fn voice_state(&self) -> VoiceState {
        VoiceState::new(self.config.voice.clone(), self.catalog.clone())
    }
}
