use crate::market::random::RandomSource;
use crate::market::types::{
    Asset, AssetDetail, AssetMarketData, ExchangeTicker, GlobalStats, MarketChartSeries,
    SeriesPoint, SPARKLINE_LEN,
};
use std::collections::BTreeMap;

const CHART_SAMPLES: usize = 100;
const CHART_START_PRICE: f64 = 65_000.0;
const CHART_VOLATILITY: f64 = 0.02;
const CHART_CIRCULATING_SUPPLY: f64 = 19_200_000.0;
const CHART_MAX_VOLUME: f64 = 30_000_000_000.0;
const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const TICKER_COUNT: usize = 10;
const GENERIC_RANK: u32 = 999;
const GENERIC_SUPPLY: f64 = 100_000_000.0;

struct CatalogEntry {
    id: &'static str,
    symbol: &'static str,
    name: &'static str,
    image_url: &'static str,
    description: &'static str,
    rank: u32,
    price: f64,
    market_cap: f64,
    fully_diluted_valuation: f64,
    volume_24h: f64,
    change_1h: f64,
    change_24h: f64,
    change_7d: f64,
    change_30d: f64,
    circulating_supply: f64,
    total_supply: Option<f64>,
    max_supply: Option<f64>,
    sparkline_base: f64,
    sparkline_span: f64,
    ticker_spread: f64,
    ticker_max_volume: f64,
}

const CATALOG: [CatalogEntry; 5] = [
    CatalogEntry {
        id: "bitcoin",
        symbol: "btc",
        name: "Bitcoin",
        image_url: "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
        description: "Bitcoin is the first decentralized cryptocurrency, run by a peer-to-peer network without a central issuer.",
        rank: 1,
        price: 65_432.1,
        market_cap: 1_258_000_000_000.0,
        fully_diluted_valuation: 1_375_000_000_000.0,
        volume_24h: 32_500_000_000.0,
        change_1h: 0.5,
        change_24h: 1.8,
        change_7d: -1.2,
        change_30d: 5.3,
        circulating_supply: 19_200_000.0,
        total_supply: Some(21_000_000.0),
        max_supply: Some(21_000_000.0),
        sparkline_base: 64_000.0,
        sparkline_span: 2_000.0,
        ticker_spread: 100.0,
        ticker_max_volume: 10_000_000.0,
    },
    CatalogEntry {
        id: "ethereum",
        symbol: "eth",
        name: "Ethereum",
        image_url: "https://assets.coingecko.com/coins/images/279/large/ethereum.png",
        description: "Ethereum is a decentralized platform for smart contracts that execute exactly as programmed.",
        rank: 2,
        price: 3_521.45,
        market_cap: 423_000_000_000.0,
        fully_diluted_valuation: 423_000_000_000.0,
        volume_24h: 18_700_000_000.0,
        change_1h: -0.2,
        change_24h: 1.5,
        change_7d: 3.2,
        change_30d: 8.7,
        circulating_supply: 120_000_000.0,
        total_supply: Some(120_000_000.0),
        max_supply: None,
        sparkline_base: 3_400.0,
        sparkline_span: 200.0,
        ticker_spread: 10.0,
        ticker_max_volume: 5_000_000.0,
    },
    CatalogEntry {
        id: "tether",
        symbol: "usdt",
        name: "Tether",
        image_url: "https://assets.coingecko.com/coins/images/325/large/Tether.png",
        description: "Tether is a stablecoin whose value tracks the U.S. dollar.",
        rank: 3,
        price: 1.0,
        market_cap: 95_800_000_000.0,
        fully_diluted_valuation: 95_800_000_000.0,
        volume_24h: 58_700_000_000.0,
        change_1h: 0.01,
        change_24h: 0.1,
        change_7d: 0.05,
        change_30d: -0.02,
        circulating_supply: 95_800_000_000.0,
        total_supply: Some(95_800_000_000.0),
        max_supply: None,
        sparkline_base: 0.995,
        sparkline_span: 0.01,
        ticker_spread: 0.005,
        ticker_max_volume: 20_000_000.0,
    },
    CatalogEntry {
        id: "binancecoin",
        symbol: "bnb",
        name: "BNB",
        image_url: "https://assets.coingecko.com/coins/images/825/large/bnb-icon2_2x.png",
        description: "BNB is the exchange token of the Binance ecosystem and the native asset of its chain.",
        rank: 4,
        price: 612.78,
        market_cap: 94_500_000_000.0,
        fully_diluted_valuation: 102_000_000_000.0,
        volume_24h: 2_100_000_000.0,
        change_1h: 0.3,
        change_24h: -0.8,
        change_7d: 2.5,
        change_30d: -1.2,
        circulating_supply: 154_000_000.0,
        total_supply: Some(154_000_000.0),
        max_supply: Some(200_000_000.0),
        sparkline_base: 600.0,
        sparkline_span: 20.0,
        ticker_spread: 5.0,
        ticker_max_volume: 1_000_000.0,
    },
    CatalogEntry {
        id: "solana",
        symbol: "sol",
        name: "Solana",
        image_url: "https://assets.coingecko.com/coins/images/4128/large/solana.png",
        description: "Solana is a high-throughput blockchain known for fast confirmation and low fees.",
        rank: 5,
        price: 142.35,
        market_cap: 61_500_000_000.0,
        fully_diluted_valuation: 78_000_000_000.0,
        volume_24h: 3_500_000_000.0,
        change_1h: 0.8,
        change_24h: 2.5,
        change_7d: 8.7,
        change_30d: 15.3,
        circulating_supply: 432_000_000.0,
        total_supply: Some(549_000_000.0),
        max_supply: None,
        sparkline_base: 135.0,
        sparkline_span: 15.0,
        ticker_spread: 2.5,
        ticker_max_volume: 2_000_000.0,
    },
];

pub fn catalog_ids() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|entry| entry.id)
}

pub fn synthetic_asset_list(rng: &mut dyn RandomSource) -> Vec<Asset> {
    CATALOG
        .iter()
        .map(|entry| Asset {
            id: entry.id.to_string(),
            symbol: entry.symbol.to_string(),
            name: entry.name.to_string(),
            image_url: entry.image_url.to_string(),
            current_price: entry.price,
            market_cap: entry.market_cap,
            fully_diluted_valuation: Some(entry.fully_diluted_valuation),
            total_volume_24h: entry.volume_24h,
            price_change_pct_1h: entry.change_1h,
            price_change_pct_24h: entry.change_24h,
            price_change_pct_7d: entry.change_7d,
            circulating_supply: entry.circulating_supply,
            total_supply: entry.total_supply,
            max_supply: entry.max_supply,
            market_cap_rank: entry.rank,
            sparkline_7d: (0..SPARKLINE_LEN)
                .map(|_| entry.sparkline_base + rng.next_unit() * entry.sparkline_span)
                .collect(),
        })
        .collect()
}

pub fn synthetic_asset_detail(id: &str, rng: &mut dyn RandomSource) -> AssetDetail {
    match CATALOG.iter().find(|entry| entry.id == id) {
        Some(entry) => curated_detail(entry, rng),
        None => generic_detail(id, rng),
    }
}

fn curated_detail(entry: &CatalogEntry, rng: &mut dyn RandomSource) -> AssetDetail {
    let base = entry.symbol.to_ascii_uppercase();
    let tickers = (1..=TICKER_COUNT)
        .map(|index| ExchangeTicker {
            market: format!("Exchange {index}"),
            base: base.clone(),
            target: "USD".to_string(),
            last_price_usd: entry.price + rng.uniform(-entry.ticker_spread, entry.ticker_spread),
            volume_usd: rng.uniform(0.0, entry.ticker_max_volume),
        })
        .collect();

    AssetDetail {
        id: entry.id.to_string(),
        symbol: entry.symbol.to_string(),
        name: entry.name.to_string(),
        description: entry.description.to_string(),
        image_url: Some(entry.image_url.to_string()),
        market_cap_rank: entry.rank,
        market_data: AssetMarketData {
            current_price: entry.price,
            market_cap: entry.market_cap,
            total_volume: entry.volume_24h,
            fully_diluted_valuation: Some(entry.fully_diluted_valuation),
            circulating_supply: entry.circulating_supply,
            total_supply: entry.total_supply,
            max_supply: entry.max_supply,
            price_change_pct_1h: entry.change_1h,
            price_change_pct_24h: entry.change_24h,
            price_change_pct_7d: entry.change_7d,
            price_change_pct_30d: entry.change_30d,
        },
        tickers,
    }
}

fn generic_detail(id: &str, rng: &mut dyn RandomSource) -> AssetDetail {
    let symbol: String = id.chars().take(3).collect();
    let base = symbol.to_uppercase();

    let market_data = AssetMarketData {
        current_price: rng.uniform(100.0, 1_000.0),
        market_cap: rng.uniform(1_000_000_000.0, 10_000_000_000.0),
        total_volume: rng.uniform(100_000_000.0, 1_000_000_000.0),
        fully_diluted_valuation: Some(rng.uniform(2_000_000_000.0, 10_000_000_000.0)),
        circulating_supply: rng.uniform(10_000_000.0, 100_000_000.0),
        total_supply: Some(GENERIC_SUPPLY),
        max_supply: Some(GENERIC_SUPPLY),
        price_change_pct_1h: rng.uniform(-1.0, 1.0),
        price_change_pct_24h: rng.uniform(-5.0, 5.0),
        price_change_pct_7d: rng.uniform(-10.0, 10.0),
        price_change_pct_30d: rng.uniform(-20.0, 20.0),
    };

    let tickers = (1..=TICKER_COUNT)
        .map(|index| ExchangeTicker {
            market: format!("Exchange {index}"),
            base: base.clone(),
            target: "USD".to_string(),
            last_price_usd: rng.uniform(100.0, 1_000.0),
            volume_usd: rng.uniform(0.0, 1_000_000.0),
        })
        .collect();

    AssetDetail {
        id: id.to_string(),
        symbol,
        name: capitalize(id),
        description: format!("No upstream description is available for {id}."),
        image_url: None,
        market_cap_rank: GENERIC_RANK,
        market_data,
        tickers,
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn synthetic_chart_series(
    days: u32,
    now_ms: i64,
    rng: &mut dyn RandomSource,
) -> MarketChartSeries {
    let days = i64::from(days.max(1));
    let spacing_ms = days * DAY_MS / CHART_SAMPLES as i64;
    let last_index = CHART_SAMPLES as i64 - 1;

    let mut price = CHART_START_PRICE;
    let mut series = MarketChartSeries {
        prices: Vec::with_capacity(CHART_SAMPLES),
        market_caps: Vec::with_capacity(CHART_SAMPLES),
        total_volumes: Vec::with_capacity(CHART_SAMPLES),
    };

    for index in 0..CHART_SAMPLES as i64 {
        if index > 0 {
            price += price * CHART_VOLATILITY * rng.uniform(-1.0, 1.0);
        }
        let timestamp_ms = now_ms - (last_index - index) * spacing_ms;
        series.prices.push(SeriesPoint {
            timestamp_ms,
            value: price,
        });
        series.market_caps.push(SeriesPoint {
            timestamp_ms,
            value: price * CHART_CIRCULATING_SUPPLY,
        });
        series.total_volumes.push(SeriesPoint {
            timestamp_ms,
            value: rng.uniform(0.0, CHART_MAX_VOLUME),
        });
    }

    series
}

pub fn synthetic_global_stats() -> GlobalStats {
    GlobalStats {
        total_market_cap_usd: 2_500_000_000_000.0,
        total_volume_usd: 150_000_000_000.0,
        market_cap_percentage: BTreeMap::from([("btc".to_string(), 45.0), ("eth".to_string(), 18.0)]),
        market_cap_change_pct_24h_usd: 2.5,
        active_cryptocurrencies: 10_000,
        markets: 600,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::random::SequenceRandom;

    #[test]
    fn asset_list_has_catalog_shape_and_full_sparklines() {
        let mut rng = SequenceRandom::new(vec![0.0, 0.5, 1.0]);
        let assets = synthetic_asset_list(&mut rng);

        let ids: Vec<&str> = assets.iter().map(|asset| asset.id.as_str()).collect();
        assert_eq!(ids, catalog_ids().collect::<Vec<_>>());
        assert_eq!(assets[0].current_price, 65_432.1);
        for asset in &assets {
            assert_eq!(asset.sparkline_7d.len(), SPARKLINE_LEN);
        }
        let bitcoin = &assets[0].sparkline_7d;
        assert_eq!(&bitcoin[..3], &[64_000.0, 65_000.0, 66_000.0]);
    }

    #[test]
    fn curated_detail_keeps_static_figures() {
        let mut rng = SequenceRandom::constant(0.5);
        let detail = synthetic_asset_detail("solana", &mut rng);

        assert_eq!(detail.name, "Solana");
        assert_eq!(detail.market_data.current_price, 142.35);
        assert_eq!(detail.market_data.price_change_pct_30d, 15.3);
        assert_eq!(detail.tickers.len(), TICKER_COUNT);
        assert_eq!(detail.tickers[0].market, "Exchange 1");
        assert_eq!(detail.tickers[9].market, "Exchange 10");
        assert_eq!(detail.tickers[0].base, "SOL");
        assert_eq!(detail.tickers[0].last_price_usd, 142.35);
    }

    #[test]
    fn generic_detail_is_keyed_off_the_id() {
        let mut rng = SequenceRandom::constant(0.0);
        let detail = synthetic_asset_detail("dogecoin", &mut rng);

        assert_eq!(detail.symbol, "dog");
        assert_eq!(detail.name, "Dogecoin");
        assert_eq!(detail.market_cap_rank, GENERIC_RANK);
        assert_eq!(detail.market_data.current_price, 100.0);
        assert_eq!(detail.tickers[0].base, "DOG");
    }

    #[test]
    fn chart_series_spans_requested_days_and_ends_now() {
        let now_ms = 1_735_000_000_000;
        let mut rng = SequenceRandom::constant(0.5);
        let series = synthetic_chart_series(7, now_ms, &mut rng);

        assert_eq!(series.prices.len(), CHART_SAMPLES);
        assert_eq!(series.prices.last().map(|p| p.timestamp_ms), Some(now_ms));
        let first = series.prices[0].timestamp_ms;
        assert_eq!(now_ms - first, 99 * 7 * DAY_MS / 100);
        assert!(series
            .prices
            .windows(2)
            .all(|pair| pair[0].timestamp_ms < pair[1].timestamp_ms));
        // Midpoint noise leaves the walk flat.
        assert!(series.prices.iter().all(|p| p.value == CHART_START_PRICE));
        assert_eq!(
            series.market_caps[0].value,
            CHART_START_PRICE * CHART_CIRCULATING_SUPPLY
        );
    }

    #[test]
    fn chart_walk_steps_by_at_most_two_percent() {
        let mut rng = SequenceRandom::new(vec![1.0, 0.3, 0.0, 0.9]);
        let series = synthetic_chart_series(0, 0, &mut rng);

        assert_eq!(series.prices[1].timestamp_ms - series.prices[0].timestamp_ms, DAY_MS / 100);
        for pair in series.prices.windows(2) {
            let ratio = pair[1].value / pair[0].value;
            assert!((0.98 - 1e-12..=1.02 + 1e-12).contains(&ratio));
        }
    }

    #[test]
    fn global_stats_match_fixed_figures() {
        let stats = synthetic_global_stats();
        assert_eq!(stats.total_market_cap_usd, 2.5e12);
        assert_eq!(stats.market_cap_percentage.get("btc"), Some(&45.0));
        assert_eq!(stats.active_cryptocurrencies, 10_000);
        assert_eq!(stats.markets, 600);
    }
}
