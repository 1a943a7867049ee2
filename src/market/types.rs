use crate::error::{AppError, FetchError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SPARKLINE_LEN: usize = 7 * 24;

pub const DEFAULT_FETCH_MAX_RETRIES: u32 = 2;
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_FETCH_BACKOFF_BASE_MS: u64 = 1_000;
pub const MAX_FETCH_RETRIES: u32 = 10;
pub const MIN_FETCH_TIMEOUT_MS: u64 = 100;
pub const MAX_FETCH_TIMEOUT_MS: u64 = 120_000;
pub const MAX_FETCH_BACKOFF_BASE_MS: u64 = 60_000;

pub const DEFAULT_SIMULATOR_INTERVAL_MS: u64 = 800;
pub const MIN_SIMULATOR_INTERVAL_MS: u64 = 50;
pub const MAX_SIMULATOR_INTERVAL_MS: u64 = 60_000;

pub const DEFAULT_SORT_BY: SortBy = SortBy::MarketCapDesc;
pub const DEFAULT_PRICE_MIN: f64 = 0.0;
pub const DEFAULT_PRICE_MAX: f64 = 100_000.0;
pub const DEFAULT_MARKET_CAP_MIN: f64 = 0.0;
pub const DEFAULT_MARKET_CAP_MAX: f64 = 1_000_000_000_000.0;

pub const FALLBACK_NOTICE: &str =
    "Using fallback data due to API limitations. Some information may not be current.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image_url: String,
    pub current_price: f64,
    pub market_cap: f64,
    pub fully_diluted_valuation: Option<f64>,
    pub total_volume_24h: f64,
    pub price_change_pct_1h: f64,
    pub price_change_pct_24h: f64,
    pub price_change_pct_7d: f64,
    pub circulating_supply: f64,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,
    pub market_cap_rank: u32,
    pub sparkline_7d: Vec<f64>,
}

/// Partial update for one asset. `None` leaves the field untouched; nested values
/// such as the sparkline are replaced wholesale, never merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetPatch {
    pub id: String,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub fully_diluted_valuation: Option<Option<f64>>,
    pub total_volume_24h: Option<f64>,
    pub price_change_pct_1h: Option<f64>,
    pub price_change_pct_24h: Option<f64>,
    pub price_change_pct_7d: Option<f64>,
    pub circulating_supply: Option<f64>,
    pub total_supply: Option<Option<f64>>,
    pub max_supply: Option<Option<f64>>,
    pub market_cap_rank: Option<u32>,
    pub sparkline_7d: Option<Vec<f64>>,
}

impl AssetPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.current_price = Some(price);
        self
    }

    pub fn apply_to(&self, asset: &mut Asset) {
        if let Some(value) = &self.symbol {
            asset.symbol.clone_from(value);
        }
        if let Some(value) = &self.name {
            asset.name.clone_from(value);
        }
        if let Some(value) = &self.image_url {
            asset.image_url.clone_from(value);
        }
        if let Some(value) = self.current_price {
            asset.current_price = value;
        }
        if let Some(value) = self.market_cap {
            asset.market_cap = value;
        }
        if let Some(value) = self.fully_diluted_valuation {
            asset.fully_diluted_valuation = value;
        }
        if let Some(value) = self.total_volume_24h {
            asset.total_volume_24h = value;
        }
        if let Some(value) = self.price_change_pct_1h {
            asset.price_change_pct_1h = value;
        }
        if let Some(value) = self.price_change_pct_24h {
            asset.price_change_pct_24h = value;
        }
        if let Some(value) = self.price_change_pct_7d {
            asset.price_change_pct_7d = value;
        }
        if let Some(value) = self.circulating_supply {
            asset.circulating_supply = value;
        }
        if let Some(value) = self.total_supply {
            asset.total_supply = value;
        }
        if let Some(value) = self.max_supply {
            asset.max_supply = value;
        }
        if let Some(value) = self.market_cap_rank {
            asset.market_cap_rank = value;
        }
        if let Some(value) = &self.sparkline_7d {
            asset.sparkline_7d.clone_from(value);
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    MarketCapDesc,
    MarketCapAsc,
    PriceDesc,
    PriceAsc,
    VolumeDesc,
    #[serde(rename = "percent_change_24h_desc")]
    PctChange24hDesc,
    #[serde(rename = "percent_change_24h_asc")]
    PctChange24hAsc,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MarketCapDesc => "market_cap_desc",
            Self::MarketCapAsc => "market_cap_asc",
            Self::PriceDesc => "price_desc",
            Self::PriceAsc => "price_asc",
            Self::VolumeDesc => "volume_desc",
            Self::PctChange24hDesc => "percent_change_24h_desc",
            Self::PctChange24hAsc => "percent_change_24h_asc",
        }
    }

    pub fn parse_str(value: &str) -> Result<Self, AppError> {
        match value {
            "market_cap_desc" => Ok(Self::MarketCapDesc),
            "market_cap_asc" => Ok(Self::MarketCapAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "price_asc" => Ok(Self::PriceAsc),
            "volume_desc" => Ok(Self::VolumeDesc),
            "percent_change_24h_desc" => Ok(Self::PctChange24hDesc),
            "percent_change_24h_asc" => Ok(Self::PctChange24hAsc),
            other => Err(AppError::InvalidArgument(format!(
                "unknown sort order '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MoverFilter {
    #[default]
    All,
    Gainers,
    Losers,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    pub sort_by: SortBy,
    pub price_min: f64,
    pub price_max: f64,
    pub market_cap_min: f64,
    pub market_cap_max: f64,
    pub show_only_gainers: bool,
    pub show_only_losers: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            sort_by: DEFAULT_SORT_BY,
            price_min: DEFAULT_PRICE_MIN,
            price_max: DEFAULT_PRICE_MAX,
            market_cap_min: DEFAULT_MARKET_CAP_MIN,
            market_cap_max: DEFAULT_MARKET_CAP_MAX,
            show_only_gainers: false,
            show_only_losers: false,
        }
    }
}

impl FilterConfig {
    pub fn set_show_only_gainers(&mut self, enabled: bool) {
        self.show_only_gainers = enabled;
        if enabled {
            self.show_only_losers = false;
        }
    }

    pub fn set_show_only_losers(&mut self, enabled: bool) {
        self.show_only_losers = enabled;
        if enabled {
            self.show_only_gainers = false;
        }
    }

    pub fn movers(&self) -> MoverFilter {
        match (self.show_only_gainers, self.show_only_losers) {
            (true, _) => MoverFilter::Gainers,
            (false, true) => MoverFilter::Losers,
            (false, false) => MoverFilter::All,
        }
    }

    /// Inclusive bounds on price and market cap plus the 24h mover filter.
    /// Inverted ranges are not rejected here and simply match nothing.
    pub fn matches(&self, asset: &Asset) -> bool {
        if asset.current_price < self.price_min || asset.current_price > self.price_max {
            return false;
        }
        if asset.market_cap < self.market_cap_min || asset.market_cap > self.market_cap_max {
            return false;
        }
        if self.show_only_gainers && asset.price_change_pct_24h < 0.0 {
            return false;
        }
        if self.show_only_losers && asset.price_change_pct_24h >= 0.0 {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FilterArgs {
    pub sort_by: Option<SortBy>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub market_cap_min: Option<f64>,
    pub market_cap_max: Option<f64>,
    pub movers: Option<MoverFilter>,
}

impl FilterArgs {
    pub fn normalize(self) -> Result<FilterConfig, AppError> {
        let price_min = self.price_min.unwrap_or(DEFAULT_PRICE_MIN);
        let price_max = self.price_max.unwrap_or(DEFAULT_PRICE_MAX);
        validate_range("price", price_min, price_max)?;

        let market_cap_min = self.market_cap_min.unwrap_or(DEFAULT_MARKET_CAP_MIN);
        let market_cap_max = self.market_cap_max.unwrap_or(DEFAULT_MARKET_CAP_MAX);
        validate_range("marketCap", market_cap_min, market_cap_max)?;

        let mut config = FilterConfig {
            sort_by: self.sort_by.unwrap_or(DEFAULT_SORT_BY),
            price_min,
            price_max,
            market_cap_min,
            market_cap_max,
            show_only_gainers: false,
            show_only_losers: false,
        };
        match self.movers.unwrap_or_default() {
            MoverFilter::All => {}
            MoverFilter::Gainers => config.set_show_only_gainers(true),
            MoverFilter::Losers => config.set_show_only_losers(true),
        }

        Ok(config)
    }
}

fn validate_range(name: &str, min: f64, max: f64) -> Result<(), AppError> {
    if !min.is_finite() || !max.is_finite() {
        return Err(AppError::InvalidArgument(format!(
            "{name} bounds must be finite numbers"
        )));
    }
    if min > max {
        return Err(AppError::InvalidArgument(format!(
            "{name}Min must not exceed {name}Max"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FetchArgs {
    pub max_retries: Option<u32>,
    pub timeout_ms: Option<u64>,
    pub backoff_base_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchConfig {
    pub max_retries: u32,
    pub timeout_ms: u64,
    pub backoff_base_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_FETCH_MAX_RETRIES,
            timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            backoff_base_ms: DEFAULT_FETCH_BACKOFF_BASE_MS,
        }
    }
}

impl FetchArgs {
    pub fn normalize(self) -> Result<FetchConfig, AppError> {
        let max_retries = self.max_retries.unwrap_or(DEFAULT_FETCH_MAX_RETRIES);
        if max_retries > MAX_FETCH_RETRIES {
            return Err(AppError::InvalidArgument(format!(
                "maxRetries must be at most {MAX_FETCH_RETRIES}"
            )));
        }

        let timeout_ms = self.timeout_ms.unwrap_or(DEFAULT_FETCH_TIMEOUT_MS);
        if !(MIN_FETCH_TIMEOUT_MS..=MAX_FETCH_TIMEOUT_MS).contains(&timeout_ms) {
            return Err(AppError::InvalidArgument(format!(
                "timeoutMs must be between {MIN_FETCH_TIMEOUT_MS} and {MAX_FETCH_TIMEOUT_MS}"
            )));
        }

        let backoff_base_ms = self
            .backoff_base_ms
            .unwrap_or(DEFAULT_FETCH_BACKOFF_BASE_MS);
        if backoff_base_ms > MAX_FETCH_BACKOFF_BASE_MS {
            return Err(AppError::InvalidArgument(format!(
                "backoffBaseMs must be at most {MAX_FETCH_BACKOFF_BASE_MS}"
            )));
        }

        Ok(FetchConfig {
            max_retries,
            timeout_ms,
            backoff_base_ms,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SimulatorArgs {
    pub interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatorConfig {
    pub interval_ms: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_SIMULATOR_INTERVAL_MS,
        }
    }
}

impl SimulatorArgs {
    pub fn normalize(self) -> Result<SimulatorConfig, AppError> {
        let interval_ms = self.interval_ms.unwrap_or(DEFAULT_SIMULATOR_INTERVAL_MS);
        if !(MIN_SIMULATOR_INTERVAL_MS..=MAX_SIMULATOR_INTERVAL_MS).contains(&interval_ms) {
            return Err(AppError::InvalidArgument(format!(
                "intervalMs must be between {MIN_SIMULATOR_INTERVAL_MS} and {MAX_SIMULATOR_INTERVAL_MS}"
            )));
        }
        Ok(SimulatorConfig { interval_ms })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SimulatorState {
    Running,
    Stopped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulatorStatusSnapshot {
    pub state: SimulatorState,
    pub interval_ms: u64,
    pub tick_count: u64,
    pub reason: Option<String>,
}

impl SimulatorStatusSnapshot {
    pub fn stopped(reason: Option<String>) -> Self {
        Self {
            state: SimulatorState::Stopped,
            interval_ms: DEFAULT_SIMULATOR_INTERVAL_MS,
            tick_count: 0,
            reason,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatorSession {
    pub running: bool,
    pub interval_ms: u64,
}

impl SimulatorSession {
    pub fn from_config(config: &SimulatorConfig) -> Self {
        Self {
            running: true,
            interval_ms: config.interval_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatorStopResult {
    pub stopped: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChartTimeframe {
    #[serde(rename = "24h")]
    H24,
    #[serde(rename = "7d")]
    D7,
    #[serde(rename = "30d")]
    D30,
    #[serde(rename = "1y")]
    Y1,
}

impl ChartTimeframe {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::H24 => "24h",
            Self::D7 => "7d",
            Self::D30 => "30d",
            Self::Y1 => "1y",
        }
    }

    pub fn days(self) -> u32 {
        match self {
            Self::H24 => 1,
            Self::D7 => 7,
            Self::D30 => 30,
            Self::Y1 => 365,
        }
    }

    pub fn parse_str(value: &str) -> Result<Self, AppError> {
        match value {
            "24h" => Ok(Self::H24),
            "7d" => Ok(Self::D7),
            "30d" => Ok(Self::D30),
            "1y" => Ok(Self::Y1),
            other => Err(AppError::InvalidArgument(format!(
                "unsupported chart timeframe '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub timestamp_ms: i64,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MarketChartSeries {
    pub prices: Vec<SeriesPoint>,
    pub market_caps: Vec<SeriesPoint>,
    pub total_volumes: Vec<SeriesPoint>,
}

impl MarketChartSeries {
    pub fn price_values(&self) -> Vec<f64> {
        self.prices.iter().map(|point| point.value).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeTicker {
    pub market: String,
    pub base: String,
    pub target: String,
    pub last_price_usd: f64,
    pub volume_usd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetMarketData {
    pub current_price: f64,
    pub market_cap: f64,
    pub total_volume: f64,
    pub fully_diluted_valuation: Option<f64>,
    pub circulating_supply: f64,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,
    pub price_change_pct_1h: f64,
    pub price_change_pct_24h: f64,
    pub price_change_pct_7d: f64,
    pub price_change_pct_30d: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetDetail {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub market_cap_rank: u32,
    pub market_data: AssetMarketData,
    pub tickers: Vec<ExchangeTicker>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_market_cap_usd: f64,
    pub total_volume_usd: f64,
    pub market_cap_percentage: BTreeMap<String, f64>,
    pub market_cap_change_pct_24h_usd: f64,
    pub active_cryptocurrencies: u64,
    pub markets: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sourced<T> {
    pub data: T,
    pub is_synthetic: bool,
}

impl<T> Sourced<T> {
    pub fn fresh(data: T) -> Self {
        Self {
            data,
            is_synthetic: false,
        }
    }

    pub fn synthetic(data: T) -> Self {
        Self {
            data,
            is_synthetic: true,
        }
    }

    pub fn notice(&self) -> Option<&'static str> {
        self.is_synthetic.then_some(FALLBACK_NOTICE)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced {
            data: f(self.data),
            is_synthetic: self.is_synthetic,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SparklineWire {
    #[serde(default)]
    pub price: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub struct MarketRowWire {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub fully_diluted_valuation: Option<f64>,
    #[serde(default)]
    pub total_volume: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_1h_in_currency: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h_in_currency: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_7d_in_currency: Option<f64>,
    #[serde(default)]
    pub circulating_supply: Option<f64>,
    #[serde(default)]
    pub total_supply: Option<f64>,
    #[serde(default)]
    pub max_supply: Option<f64>,
    #[serde(default)]
    pub sparkline_in_7d: Option<SparklineWire>,
}

impl TryFrom<MarketRowWire> for Asset {
    type Error = FetchError;

    fn try_from(value: MarketRowWire) -> Result<Self, Self::Error> {
        if value.id.trim().is_empty() {
            return Err(FetchError::Malformed(
                "market row is missing an id".to_string(),
            ));
        }

        let current_price = value.current_price.unwrap_or(0.0);
        if !current_price.is_finite() || current_price < 0.0 {
            return Err(FetchError::Malformed(format!(
                "price for '{}' must be finite and non-negative",
                value.id
            )));
        }

        Ok(Self {
            id: value.id,
            symbol: value.symbol,
            name: value.name,
            image_url: value.image.unwrap_or_default(),
            current_price,
            market_cap: value.market_cap.unwrap_or(0.0),
            fully_diluted_valuation: value.fully_diluted_valuation,
            total_volume_24h: value.total_volume.unwrap_or(0.0),
            price_change_pct_1h: value.price_change_percentage_1h_in_currency.unwrap_or(0.0),
            price_change_pct_24h: value
                .price_change_percentage_24h
                .or(value.price_change_percentage_24h_in_currency)
                .unwrap_or(0.0),
            price_change_pct_7d: value.price_change_percentage_7d_in_currency.unwrap_or(0.0),
            circulating_supply: value.circulating_supply.unwrap_or(0.0),
            total_supply: value.total_supply,
            max_supply: value.max_supply,
            market_cap_rank: value.market_cap_rank.filter(|rank| *rank > 0).unwrap_or(u32::MAX),
            sparkline_7d: value
                .sparkline_in_7d
                .map(|sparkline| sparkline.price)
                .unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct UsdQuoteWire {
    #[serde(default)]
    pub usd: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct DescriptionWire {
    #[serde(default)]
    pub en: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ImageWire {
    #[serde(default)]
    pub large: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct DetailMarketDataWire {
    #[serde(default)]
    pub current_price: UsdQuoteWire,
    #[serde(default)]
    pub market_cap: UsdQuoteWire,
    #[serde(default)]
    pub total_volume: UsdQuoteWire,
    #[serde(default)]
    pub fully_diluted_valuation: UsdQuoteWire,
    #[serde(default)]
    pub circulating_supply: Option<f64>,
    #[serde(default)]
    pub total_supply: Option<f64>,
    #[serde(default)]
    pub max_supply: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_1h_in_currency: UsdQuoteWire,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_7d: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_30d: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct TickerMarketWire {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TickerWire {
    #[serde(default)]
    pub market: TickerMarketWire,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub converted_last: UsdQuoteWire,
    #[serde(default)]
    pub converted_volume: UsdQuoteWire,
}

#[derive(Debug, Deserialize)]
pub struct AssetDetailWire {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub description: DescriptionWire,
    #[serde(default)]
    pub image: ImageWire,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    pub market_data: Option<DetailMarketDataWire>,
    #[serde(default)]
    pub tickers: Vec<TickerWire>,
}

impl TryFrom<AssetDetailWire> for AssetDetail {
    type Error = FetchError;

    fn try_from(value: AssetDetailWire) -> Result<Self, Self::Error> {
        let market_data = value.market_data.ok_or_else(|| {
            FetchError::Malformed(format!("detail for '{}' has no market_data", value.id))
        })?;
        let current_price = market_data.current_price.usd.ok_or_else(|| {
            FetchError::Malformed(format!("detail for '{}' has no usd price", value.id))
        })?;
        if !current_price.is_finite() || current_price < 0.0 {
            return Err(FetchError::Malformed(
                "detail price must be finite and non-negative".to_string(),
            ));
        }

        let tickers = value
            .tickers
            .into_iter()
            .map(|ticker| ExchangeTicker {
                market: ticker.market.name,
                base: ticker.base,
                target: ticker.target,
                last_price_usd: ticker.converted_last.usd.unwrap_or(0.0),
                volume_usd: ticker.converted_volume.usd.unwrap_or(0.0),
            })
            .collect();

        Ok(Self {
            id: value.id,
            symbol: value.symbol,
            name: value.name,
            description: value.description.en.unwrap_or_default(),
            image_url: value.image.large,
            market_cap_rank: value
                .market_cap_rank
                .filter(|rank| *rank > 0)
                .unwrap_or(u32::MAX),
            market_data: AssetMarketData {
                current_price,
                market_cap: market_data.market_cap.usd.unwrap_or(0.0),
                total_volume: market_data.total_volume.usd.unwrap_or(0.0),
                fully_diluted_valuation: market_data.fully_diluted_valuation.usd,
                circulating_supply: market_data.circulating_supply.unwrap_or(0.0),
                total_supply: market_data.total_supply,
                max_supply: market_data.max_supply,
                price_change_pct_1h: market_data
                    .price_change_percentage_1h_in_currency
                    .usd
                    .unwrap_or(0.0),
                price_change_pct_24h: market_data.price_change_percentage_24h.unwrap_or(0.0),
                price_change_pct_7d: market_data.price_change_percentage_7d.unwrap_or(0.0),
                price_change_pct_30d: market_data.price_change_percentage_30d.unwrap_or(0.0),
            },
            tickers,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct MarketChartWire {
    pub prices: Vec<(i64, f64)>,
    #[serde(default)]
    pub market_caps: Vec<(i64, f64)>,
    #[serde(default)]
    pub total_volumes: Vec<(i64, f64)>,
}

impl TryFrom<MarketChartWire> for MarketChartSeries {
    type Error = FetchError;

    fn try_from(value: MarketChartWire) -> Result<Self, Self::Error> {
        if value.prices.iter().any(|(_, price)| !price.is_finite()) {
            return Err(FetchError::Malformed(
                "chart prices must be finite".to_string(),
            ));
        }

        Ok(Self {
            prices: ordered_series(value.prices),
            market_caps: ordered_series(value.market_caps),
            total_volumes: ordered_series(value.total_volumes),
        })
    }
}

fn ordered_series(mut raw: Vec<(i64, f64)>) -> Vec<SeriesPoint> {
    raw.sort_by_key(|(timestamp_ms, _)| *timestamp_ms);
    raw.dedup_by_key(|(timestamp_ms, _)| *timestamp_ms);
    raw.into_iter()
        .map(|(timestamp_ms, value)| SeriesPoint {
            timestamp_ms,
            value,
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct GlobalDataWire {
    #[serde(default)]
    pub active_cryptocurrencies: u64,
    #[serde(default)]
    pub markets: u64,
    #[serde(default)]
    pub total_market_cap: BTreeMap<String, f64>,
    #[serde(default)]
    pub total_volume: BTreeMap<String, f64>,
    #[serde(default)]
    pub market_cap_percentage: BTreeMap<String, f64>,
    #[serde(default)]
    pub market_cap_change_percentage_24h_usd: f64,
}

#[derive(Debug, Deserialize)]
pub struct GlobalWire {
    pub data: GlobalDataWire,
}

impl TryFrom<GlobalWire> for GlobalStats {
    type Error = FetchError;

    fn try_from(value: GlobalWire) -> Result<Self, Self::Error> {
        let data = value.data;
        let total_market_cap_usd = data.total_market_cap.get("usd").copied().ok_or_else(|| {
            FetchError::Malformed("global data has no usd market cap".to_string())
        })?;

        Ok(Self {
            total_market_cap_usd,
            total_volume_usd: data.total_volume.get("usd").copied().unwrap_or(0.0),
            market_cap_percentage: data.market_cap_percentage,
            market_cap_change_pct_24h_usd: data.market_cap_change_percentage_24h_usd,
            active_cryptocurrencies: data.active_cryptocurrencies,
            markets: data.markets,
        })
    }
}
