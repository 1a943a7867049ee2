pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod market;
pub mod state;
pub mod telemetry;

use config::AppConfig;
use db::initialize_pool_from_path;
use error::AppError;
use market::fetch::ReqwestTransport;
use market::random::{shared, ThreadRandom};
use state::AppState;
use std::sync::Arc;
use tracing::info;

pub async fn bootstrap(config: AppConfig) -> Result<AppState, AppError> {
    let db_path = config.db_path()?;
    let db_pool = initialize_pool_from_path(&db_path).await?;
    info!(path = %db_path.display(), "database ready");

    let transport = Arc::new(ReqwestTransport::new()?);
    let rng = shared(ThreadRandom::from_entropy());

    Ok(AppState::new(config, db_pool, transport, rng))
}
