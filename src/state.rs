use crate::config::AppConfig;
use crate::market::api::MarketApi;
use crate::market::fetch::{HttpTransport, ResilientClient};
use crate::market::preferences::{SqlitePreferences, Watchlist};
use crate::market::random::SharedRandom;
use crate::market::simulator::SimulatorHandle;
use crate::market::store::MarketStore;
use crate::market::types::SimulatorStatusSnapshot;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};

pub struct AppState {
    pub started_at: Instant,
    pub config: AppConfig,
    pub db_pool: SqlitePool,
    pub market_api: MarketApi,
    pub market_store: Arc<MarketStore>,
    pub rng: SharedRandom,
    pub watchlist: Watchlist<SqlitePreferences>,
    pub simulator: Mutex<Option<SimulatorHandle>>,
    pub simulator_status: Arc<RwLock<SimulatorStatusSnapshot>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db_pool: SqlitePool,
        transport: Arc<dyn HttpTransport>,
        rng: SharedRandom,
    ) -> Self {
        let client = ResilientClient::new(transport, config.fetch);
        let market_api = MarketApi::new(client, config.api_base_url.clone(), Arc::clone(&rng));
        let simulator_status =
            SimulatorStatusSnapshot::stopped(Some("live updates idle".to_string()));

        Self {
            started_at: Instant::now(),
            watchlist: Watchlist::new(SqlitePreferences::new(db_pool.clone())),
            config,
            db_pool,
            market_api,
            market_store: Arc::new(MarketStore::new()),
            rng,
            simulator: Mutex::new(None),
            simulator_status: Arc::new(RwLock::new(simulator_status)),
        }
    }
}
