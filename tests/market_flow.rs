use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use marketdesk::commands::live_updates::{
    live_updates_status, start_live_updates, stop_live_updates,
};
use marketdesk::commands::markets::{
    apply_filters, asset_chart, global_stats, load_markets, visible_assets, VisibleAssetsArgs,
};
use marketdesk::commands::watchlist::{watchlist_assets, watchlist_get, watchlist_toggle};
use marketdesk::config::AppConfig;
use marketdesk::db::run_migrations;
use marketdesk::error::FetchError;
use marketdesk::market::chart::{
    hit_test_chart, hit_test_sparkline, plot_series, plot_values, price_gridlines,
    time_gridlines, ChartRect, PRICE_BANDS,
};
use marketdesk::market::fetch::{HttpResponse, HttpTransport};
use marketdesk::market::random::{shared, SequenceRandom};
use marketdesk::market::types::{
    ChartTimeframe, FetchConfig, FilterArgs, MoverFilter, SimulatorArgs, SimulatorState,
    SortBy, SPARKLINE_LEN,
};
use marketdesk::state::AppState;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

/// Serves canned bodies by URL fragment; unmatched URLs fail at the transport level.
struct RoutedTransport {
    routes: Vec<(&'static str, String)>,
}

impl HttpTransport for RoutedTransport {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, FetchError>> {
        let response = self
            .routes
            .iter()
            .find(|(fragment, _)| url.contains(fragment))
            .map(|(_, body)| HttpResponse::ok(body.clone()))
            .ok_or_else(|| FetchError::Transport(format!("no route for {url}")));
        async move { response }.boxed()
    }
}

fn market_row(
    id: &str,
    symbol: &str,
    price: f64,
    market_cap: f64,
    change_24h: f64,
    rank: u32,
) -> String {
    let sparkline = (0..SPARKLINE_LEN)
        .map(|step| format!("{:.2}", price * (1.0 + step as f64 / 10_000.0)))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        r#"{{"id":"{id}","symbol":"{symbol}","name":"{id}","image":"https://img.test/{id}.png","current_price":{price},"market_cap":{market_cap},"market_cap_rank":{rank},"total_volume":1000000.0,"price_change_percentage_24h":{change_24h},"price_change_percentage_1h_in_currency":0.1,"price_change_percentage_7d_in_currency":-0.4,"circulating_supply":1000.0,"total_supply":null,"max_supply":null,"sparkline_in_7d":{{"price":[{sparkline}]}}}}"#
    )
}

fn markets_body() -> String {
    format!(
        "[{},{},{}]",
        market_row("bitcoin", "btc", 65_000.0, 1.2e12, 2.5, 1),
        market_row("ethereum", "eth", 3_200.0, 3.8e11, -1.2, 2),
        market_row("dogecoin", "doge", 0.15, 2.1e10, 0.0, 9),
    )
}

fn chart_body() -> String {
    let base_ms: i64 = 1_700_000_000_000;
    let prices = (0..48)
        .map(|hour| format!("[{},{}.0]", base_ms + hour * 3_600_000, 60_000 + hour * 50))
        .collect::<Vec<_>>()
        .join(",");
    format!(r#"{{"prices":[{prices}],"market_caps":[],"total_volumes":[]}}"#)
}

fn quick_config() -> AppConfig {
    AppConfig {
        fetch: FetchConfig {
            max_retries: 0,
            timeout_ms: 1_000,
            backoff_base_ms: 1,
        },
        ..AppConfig::default()
    }
}

async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite should initialize");
    run_migrations(&pool)
        .await
        .expect("migrations should apply");
    pool
}

async fn app_state(routes: Vec<(&'static str, String)>) -> AppState {
    AppState::new(
        quick_config(),
        memory_pool().await,
        Arc::new(RoutedTransport { routes }),
        shared(SequenceRandom::constant(0.75)),
    )
}

#[tokio::test]
async fn loaded_markets_flow_through_filters_and_chart_geometry() {
    let state = app_state(vec![
        ("/market_chart", chart_body()),
        ("/coins/markets", markets_body()),
    ])
    .await;

    let loaded = load_markets(&state).await.expect("load markets");
    assert_eq!(loaded.asset_count, 3);
    assert!(!loaded.is_synthetic);
    assert_eq!(loaded.notice, None);
    assert!(!state.market_store.is_loading());

    // bitcoin sits above the default market cap ceiling
    let visible = visible_assets(&state, VisibleAssetsArgs::default()).await.expect("visible");
    let ids: Vec<&str> = visible.iter().map(|asset| asset.id.as_str()).collect();
    assert_eq!(ids, vec!["ethereum", "dogecoin"]);

    apply_filters(
        &state,
        FilterArgs {
            sort_by: Some(SortBy::PriceAsc),
            market_cap_max: Some(2e12),
            movers: Some(MoverFilter::Gainers),
            ..FilterArgs::default()
        },
    )
    .await
    .expect("filters should apply");
    let gainers = visible_assets(&state, VisibleAssetsArgs::default()).await.expect("visible");
    let ids: Vec<&str> = gainers.iter().map(|asset| asset.id.as_str()).collect();
    assert_eq!(ids, vec!["dogecoin", "bitcoin"]);

    let searched = visible_assets(
        &state,
        VisibleAssetsArgs {
            search: Some("BTC".to_string()),
            ..VisibleAssetsArgs::default()
        },
    )
        .await
        .expect("search");
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].id, "bitcoin");

    let inverted = apply_filters(
        &state,
        FilterArgs {
            price_min: Some(10.0),
            price_max: Some(1.0),
            ..FilterArgs::default()
        },
    )
    .await;
    assert!(inverted.is_err());
    assert_eq!(state.market_store.filters().sort_by, SortBy::PriceAsc);

    let chart = asset_chart(&state, "bitcoin".to_string(), Some(ChartTimeframe::H24))
        .await
        .expect("chart");
    assert!(!chart.is_synthetic);
    assert_eq!(chart.data.prices.len(), 48);

    let rect = ChartRect::price_chart(800.0);
    let geometry = plot_series(&chart.data.prices, &rect).expect("non-empty series");
    let last = geometry.points.last().expect("points");
    assert!((last.x - (rect.width - rect.padding.right)).abs() < 1e-9);
    assert_eq!(
        hit_test_chart(&geometry.points, last.x - 2.0, last.y + 2.0),
        Some(47)
    );
    assert_eq!(price_gridlines(&geometry.scale, &rect).len(), PRICE_BANDS + 1);
    let time_lines = time_gridlines(&chart.data.prices, &rect, ChartTimeframe::H24);
    assert_eq!(time_lines.first().map(|line| line.index), Some(0));
    assert!(time_lines.iter().all(|line| line.label.contains(':')));

    let bitcoin = state
        .market_store
        .select_by_id("bitcoin")
        .expect("bitcoin stored");
    let sparkline = plot_values(&bitcoin.sparkline_7d, &ChartRect::sparkline())
        .expect("sparkline geometry");
    assert_eq!(sparkline.points.len(), SPARKLINE_LEN);
    assert_eq!(hit_test_sparkline(&sparkline.points, 2.0), Some(0));
}

#[tokio::test]
async fn unreachable_upstream_serves_generated_data_and_watchlist_persists() {
    let state = app_state(Vec::new()).await;

    let loaded = load_markets(&state).await.expect("load markets");
    assert!(loaded.is_synthetic);
    assert_eq!(loaded.asset_count, 5);
    assert!(loaded.notice.is_some());

    let global = global_stats(&state).await.expect("global stats");
    assert!(global.is_synthetic);
    assert!(global.data.total_market_cap_usd > 0.0);

    let chart = asset_chart(&state, "solana".to_string(), None)
        .await
        .expect("chart");
    assert!(chart.is_synthetic);
    assert!(!chart.data.prices.is_empty());

    assert!(asset_chart(&state, "../global".to_string(), None).await.is_err());

    let toggled = watchlist_toggle(&state, "ethereum".to_string())
        .await
        .expect("toggle");
    assert!(toggled.watched);
    watchlist_toggle(&state, "solana".to_string())
        .await
        .expect("toggle");
    assert_eq!(
        watchlist_get(&state).await.expect("watchlist"),
        vec!["ethereum".to_string(), "solana".to_string()]
    );

    let watched = watchlist_assets(&state).await.expect("watched assets");
    assert!(watched.is_synthetic);
    let mut ids: Vec<&str> = watched.data.iter().map(|asset| asset.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["ethereum", "solana"]);

    let untoggled = watchlist_toggle(&state, "ethereum".to_string())
        .await
        .expect("toggle");
    assert!(!untoggled.watched);
    assert_eq!(
        watchlist_get(&state).await.expect("watchlist"),
        vec!["solana".to_string()]
    );
}

#[tokio::test]
async fn live_updates_patch_the_store_until_stopped() {
    let state = app_state(vec![("/coins/markets", markets_body())]).await;
    load_markets(&state).await.expect("load markets");
    let before = state.market_store.snapshot();

    tokio::time::pause();

    assert!(start_live_updates(
        &state,
        Some(SimulatorArgs {
            interval_ms: Some(10),
        })
    )
    .await
    .is_err());

    let session = start_live_updates(
        &state,
        Some(SimulatorArgs {
            interval_ms: Some(100),
        }),
    )
    .await
    .expect("start");
    assert!(session.running);
    assert_eq!(session.interval_ms, 100);

    tokio::time::sleep(Duration::from_millis(350)).await;

    let status = live_updates_status(&state).await.expect("status");
    assert_eq!(status.state, SimulatorState::Running);
    assert_eq!(status.tick_count, 3);

    let after = state.market_store.snapshot();
    assert_eq!(after.len(), before.len());
    for (old, new) in before.iter().zip(after.iter()) {
        assert_eq!(old.id, new.id);
        assert_ne!(old.current_price, new.current_price);
        assert_eq!(new.sparkline_7d.len(), SPARKLINE_LEN);
        assert_eq!(new.sparkline_7d.last().copied(), Some(new.current_price));
    }

    let stopped = stop_live_updates(&state).await.expect("stop");
    assert!(stopped.stopped);
    let frozen = state.market_store.snapshot();

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(state.market_store.snapshot(), frozen);

    let status = live_updates_status(&state).await.expect("status");
    assert_eq!(status.state, SimulatorState::Stopped);
    assert_eq!(status.tick_count, 3);

    let again = stop_live_updates(&state).await.expect("stop twice");
    assert!(!again.stopped);
}
