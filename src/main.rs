use marketdesk::commands::{
    app_info::app_info,
    health::health,
    live_updates::{live_updates_status, start_live_updates, stop_live_updates},
    markets::{global_stats, load_markets, visible_assets, VisibleAssetsArgs},
    watchlist::watchlist_get,
};
use marketdesk::config::AppConfig;
use marketdesk::error::AppError;
use marketdesk::market::chart::format_price;
use marketdesk::telemetry::init_tracing;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

const TABLE_REPORT_INTERVAL: Duration = Duration::from_secs(10);
const TABLE_REPORT_ROWS: usize = 5;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_tracing();

    let config = AppConfig::from_env()?;
    let info = app_info(&config.api_base_url);
    info!(
        product = %info.product_name,
        version = %info.version,
        api = %info.api_base_url,
        "starting up"
    );

    let state = marketdesk::bootstrap(config).await?;

    let loaded = load_markets(&state).await?;
    if let Some(notice) = loaded.notice {
        warn!(notice, "showing generated market data");
    }

    let global = global_stats(&state).await?;
    info!(
        total_market_cap = %format_price(global.data.total_market_cap_usd),
        active = global.data.active_cryptocurrencies,
        synthetic = global.is_synthetic,
        "global market stats"
    );

    let watchlist = watchlist_get(&state).await?;
    info!(watched = watchlist.len(), "watchlist loaded");

    let session = start_live_updates(&state, None).await?;
    info!(interval_ms = session.interval_ms, "live updates running, press Ctrl+C to stop");

    let mut report = tokio::time::interval(TABLE_REPORT_INTERVAL);
    report.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                warn!("shutdown signal received");
                break;
            }
            _ = report.tick() => {
                let status = live_updates_status(&state).await?;
                let rows = visible_assets(&state, VisibleAssetsArgs::default()).await?;
                info!(ticks = status.tick_count, visible = rows.len(), "market table");
                for asset in rows.iter().take(TABLE_REPORT_ROWS) {
                    info!(
                        rank = asset.market_cap_rank,
                        symbol = %asset.symbol.to_uppercase(),
                        price = %format_price(asset.current_price),
                        change_24h = %format!("{:+.2}%", asset.price_change_pct_24h),
                        "row"
                    );
                }
            }
        }
    }

    let stopped = stop_live_updates(&state).await?;
    let health = health(&state).await?;
    info!(
        stopped = stopped.stopped,
        uptime_ms = health.uptime_ms as u64,
        db = health.db,
        "shut down complete"
    );
    state.db_pool.close().await;
    Ok(())
}
