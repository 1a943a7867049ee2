use crate::error::AppError;
use crate::market::store::{search_assets, MarketStore, TableSort};
use crate::market::types::{
    Asset, AssetDetail, ChartTimeframe, FilterArgs, FilterConfig, GlobalStats, MarketChartSeries,
    Sourced,
};
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoadMarketsResult {
    pub asset_count: usize,
    pub is_synthetic: bool,
    pub notice: Option<&'static str>,
}

struct LoadingGuard<'a> {
    store: &'a MarketStore,
}

impl<'a> LoadingGuard<'a> {
    fn begin(store: &'a MarketStore) -> Self {
        store.set_loading(true);
        Self { store }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.store.set_loading(false);
    }
}

pub async fn load_markets(state: &AppState) -> Result<LoadMarketsResult, AppError> {
    let (asset_count, is_synthetic, notice) = {
        let _loading = LoadingGuard::begin(&state.market_store);
        let sourced = state.market_api.asset_list().await;
        let summary = (sourced.data.len(), sourced.is_synthetic, sourced.notice());
        state.market_store.replace_all(sourced.data);
        summary
    };
    info!(asset_count, is_synthetic, "market table loaded");

    Ok(LoadMarketsResult {
        asset_count,
        is_synthetic,
        notice,
    })
}

pub async fn apply_filters(state: &AppState, args: FilterArgs) -> Result<FilterConfig, AppError> {
    let filters = args.normalize()?;
    state.market_store.set_filters(filters.clone());
    Ok(filters)
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VisibleAssetsArgs {
    pub search: Option<String>,
    pub table_sort: Option<TableSort>,
}

pub async fn visible_assets(
    state: &AppState,
    args: VisibleAssetsArgs,
) -> Result<Vec<Asset>, AppError> {
    let visible = state.market_store.select_visible_sorted();
    let mut visible = match args.search {
        Some(term) => search_assets(visible, &term),
        None => visible,
    };
    if let Some(table_sort) = args.table_sort {
        table_sort.apply(&mut visible);
    }
    Ok(visible)
}

pub async fn asset_detail(state: &AppState, id: String) -> Result<Sourced<AssetDetail>, AppError> {
    let id = validate_asset_id(&id)?;
    Ok(state.market_api.asset_detail(id).await)
}

pub async fn asset_chart(
    state: &AppState,
    id: String,
    timeframe: Option<ChartTimeframe>,
) -> Result<Sourced<MarketChartSeries>, AppError> {
    let id = validate_asset_id(&id)?;
    let timeframe = timeframe.unwrap_or(ChartTimeframe::D7);
    Ok(state.market_api.market_chart(id, timeframe).await)
}

pub async fn global_stats(state: &AppState) -> Result<Sourced<GlobalStats>, AppError> {
    Ok(state.market_api.global_stats().await)
}

pub(crate) fn validate_asset_id(id: &str) -> Result<&str, AppError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AppError::InvalidArgument(
            "asset id must not be empty".to_string(),
        ));
    }
    if id.chars().all(|ch| ch == '.') {
        return Err(AppError::InvalidArgument(format!(
            "asset id '{id}' is not a valid path segment"
        )));
    }
    if !id
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.')
    {
        return Err(AppError::InvalidArgument(format!(
            "asset id '{id}' contains unsupported characters"
        )));
    }
    Ok(id)
}
