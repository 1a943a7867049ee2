use crate::{error::AppError, state::AppState};
use serde::Serialize;
use sqlx::SqlitePool;
use std::time::Instant;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_ms: u128,
    pub db: &'static str,
    pub asset_count: usize,
    pub live_updates_running: bool,
}

pub async fn build_health_response(
    started_at: Instant,
    pool: &SqlitePool,
    asset_count: usize,
    live_updates_running: bool,
) -> HealthResponse {
    let db_status = match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(pool)
        .await
    {
        Ok(_) => "ok",
        Err(_) => "error",
    };

    HealthResponse {
        status: "ok",
        uptime_ms: started_at.elapsed().as_millis(),
        db: db_status,
        asset_count,
        live_updates_running,
    }
}

pub async fn health(state: &AppState) -> Result<HealthResponse, AppError> {
    let live_updates_running = state
        .simulator
        .lock()
        .await
        .as_ref()
        .is_some_and(|handle| handle.is_running());

    Ok(build_health_response(
        state.started_at,
        &state.db_pool,
        state.market_store.len(),
        live_updates_running,
    )
    .await)
}
