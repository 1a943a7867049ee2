use crate::error::FetchError;
use crate::market::coingecko;
use crate::market::fallback;
use crate::market::fetch::ResilientClient;
use crate::market::random::{RandomSource, SharedRandom};
use crate::market::types::{
    Asset, AssetDetail, AssetDetailWire, ChartTimeframe, GlobalStats, GlobalWire,
    MarketChartSeries, MarketChartWire, MarketRowWire, Sourced,
};
use chrono::Utc;
use tracing::warn;

#[derive(Clone)]
pub struct MarketApi {
    client: ResilientClient,
    base_url: String,
    rng: SharedRandom,
}

impl MarketApi {
    pub fn new(client: ResilientClient, base_url: impl Into<String>, rng: SharedRandom) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            rng,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn asset_list(&self) -> Sourced<Vec<Asset>> {
        let endpoint = coingecko::markets_endpoint(&self.base_url);
        match self.fetch_assets(&endpoint).await {
            Ok(assets) => Sourced::fresh(assets),
            Err(error) => {
                warn!(%error, "asset list unavailable, using fallback data");
                Sourced::synthetic(self.generate(fallback::synthetic_asset_list))
            }
        }
    }

    pub async fn assets_by_ids(&self, ids: &[String]) -> Sourced<Vec<Asset>> {
        if ids.is_empty() {
            return Sourced::fresh(Vec::new());
        }

        let endpoint = coingecko::markets_by_ids_endpoint(&self.base_url, ids);
        match self.fetch_assets(&endpoint).await {
            Ok(assets) => Sourced::fresh(assets),
            Err(error) => {
                warn!(%error, requested = ids.len(), "watchlist assets unavailable, using fallback data");
                let mut assets = self.generate(fallback::synthetic_asset_list);
                assets.retain(|asset| ids.contains(&asset.id));
                Sourced::synthetic(assets)
            }
        }
    }

    pub async fn asset_detail(&self, id: &str) -> Sourced<AssetDetail> {
        let endpoint = coingecko::detail_endpoint(&self.base_url, id);
        let result = match self.client.fetch_json::<AssetDetailWire>(&endpoint).await {
            Ok(wire) => AssetDetail::try_from(wire),
            Err(error) => Err(error),
        };

        match result {
            Ok(detail) => Sourced::fresh(detail),
            Err(error) => {
                warn!(%error, id, "asset detail unavailable, using fallback data");
                Sourced::synthetic(self.generate(|rng| fallback::synthetic_asset_detail(id, rng)))
            }
        }
    }

    pub async fn market_chart(&self, id: &str, timeframe: ChartTimeframe) -> Sourced<MarketChartSeries> {
        let days = timeframe.days();
        let endpoint = coingecko::market_chart_endpoint(&self.base_url, id, days);
        let result = match self.client.fetch_json::<MarketChartWire>(&endpoint).await {
            Ok(wire) => MarketChartSeries::try_from(wire),
            Err(error) => Err(error),
        };

        match result {
            Ok(series) => Sourced::fresh(series),
            Err(error) => {
                warn!(%error, id, timeframe = timeframe.as_str(), "market chart unavailable, using fallback data");
                let now_ms = Utc::now().timestamp_millis();
                Sourced::synthetic(
                    self.generate(|rng| fallback::synthetic_chart_series(days, now_ms, rng)),
                )
            }
        }
    }

    pub async fn global_stats(&self) -> Sourced<GlobalStats> {
        let endpoint = coingecko::global_endpoint(&self.base_url);
        let result = match self.client.fetch_json::<GlobalWire>(&endpoint).await {
            Ok(wire) => GlobalStats::try_from(wire),
            Err(error) => Err(error),
        };

        match result {
            Ok(stats) => Sourced::fresh(stats),
            Err(error) => {
                warn!(%error, "global stats unavailable, using fallback data");
                Sourced::synthetic(fallback::synthetic_global_stats())
            }
        }
    }

    fn generate<T>(&self, build: impl FnOnce(&mut dyn RandomSource) -> T) -> T {
        let mut rng = self.rng.lock();
        build(&mut *rng)
    }

    async fn fetch_assets(&self, endpoint: &str) -> Result<Vec<Asset>, FetchError> {
        let rows = self.client.fetch_json::<Vec<MarketRowWire>>(endpoint).await?;
        let mut assets = Vec::with_capacity(rows.len());
        for row in rows {
            assets.push(row.try_into()?);
        }
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::fetch::testing::{Scripted, ScriptedTransport};
    use crate::market::fetch::HttpResponse;
    use crate::market::random::{shared, SequenceRandom};
    use crate::market::types::{FetchConfig, FALLBACK_NOTICE};
    use std::sync::Arc;

    fn api(transport: Arc<ScriptedTransport>) -> MarketApi {
        let client = ResilientClient::new(
            transport,
            FetchConfig {
                max_retries: 1,
                timeout_ms: 1_000,
                backoff_base_ms: 10,
            },
        );
        MarketApi::new(
            client,
            coingecko::COINGECKO_BASE_URL,
            shared(SequenceRandom::constant(0.5)),
        )
    }

    fn respond(body: &str) -> Scripted {
        Scripted::Respond(HttpResponse::ok(body.as_bytes().to_vec()))
    }

    #[tokio::test(start_paused = true)]
    async fn asset_list_returns_fresh_rows() {
        let transport = Arc::new(ScriptedTransport::new(vec![respond(
            r#"[{"id":"bitcoin","symbol":"btc","name":"Bitcoin","current_price":70000.5,"market_cap":1,"market_cap_rank":1,"total_volume":2}]"#,
        )]));

        let result = api(transport.clone()).asset_list().await;

        assert!(!result.is_synthetic);
        assert_eq!(result.notice(), None);
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0].current_price, 70_000.5);
        assert!(transport.requests()[0].contains("/coins/markets?"));
    }

    #[tokio::test(start_paused = true)]
    async fn asset_list_falls_back_after_exhaustion() {
        let transport = Arc::new(ScriptedTransport::always_failing());

        let result = api(transport.clone()).asset_list().await;

        assert!(result.is_synthetic);
        assert_eq!(result.notice(), Some(FALLBACK_NOTICE));
        assert_eq!(result.data.len(), 5);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_list_falls_back_without_retry() {
        let transport = Arc::new(ScriptedTransport::new(vec![respond(r#"{"error":"nope"}"#)]));

        let result = api(transport.clone()).asset_list().await;

        assert!(result.is_synthetic);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_watchlist_skips_the_network() {
        let transport = Arc::new(ScriptedTransport::always_failing());

        let result = api(transport.clone()).assets_by_ids(&[]).await;

        assert!(!result.is_synthetic);
        assert!(result.data.is_empty());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn watchlist_fallback_is_filtered_to_requested_ids() {
        let transport = Arc::new(ScriptedTransport::always_failing());
        let ids = vec!["solana".to_string(), "unknown-coin".to_string()];

        let result = api(transport).assets_by_ids(&ids).await;

        assert!(result.is_synthetic);
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0].id, "solana");
    }

    #[tokio::test(start_paused = true)]
    async fn detail_falls_back_to_generic_record() {
        let transport = Arc::new(ScriptedTransport::always_failing());

        let result = api(transport).asset_detail("dogecoin").await;

        assert!(result.is_synthetic);
        assert_eq!(result.data.name, "Dogecoin");
        assert_eq!(result.data.market_cap_rank, 999);
    }

    #[tokio::test(start_paused = true)]
    async fn chart_requests_timeframe_days_and_orders_points() {
        let transport = Arc::new(ScriptedTransport::new(vec![respond(
            r#"{"prices":[[2000,2.0],[1000,1.0]],"market_caps":[],"total_volumes":[]}"#,
        )]));

        let result = api(transport.clone())
            .market_chart("bitcoin", ChartTimeframe::Y1)
            .await;

        assert!(!result.is_synthetic);
        assert_eq!(result.data.price_values(), vec![1.0, 2.0]);
        assert!(transport.requests()[0].ends_with("days=365"));
    }

    #[tokio::test(start_paused = true)]
    async fn chart_fallback_has_one_hundred_samples() {
        let transport = Arc::new(ScriptedTransport::always_failing());

        let result = api(transport)
            .market_chart("bitcoin", ChartTimeframe::H24)
            .await;

        assert!(result.is_synthetic);
        assert_eq!(result.data.prices.len(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn global_stats_unwraps_data_envelope() {
        let transport = Arc::new(ScriptedTransport::new(vec![respond(
            r#"{"data":{"active_cryptocurrencies":12000,"markets":900,"total_market_cap":{"usd":3.1e12},"total_volume":{"usd":9.0e10},"market_cap_percentage":{"btc":52.1},"market_cap_change_percentage_24h_usd":-1.5}}"#,
        )]));

        let result = api(transport).global_stats().await;

        assert!(!result.is_synthetic);
        assert_eq!(result.data.total_market_cap_usd, 3.1e12);
        assert_eq!(result.data.active_cryptocurrencies, 12_000);
        assert_eq!(result.data.market_cap_change_pct_24h_usd, -1.5);
    }
}
