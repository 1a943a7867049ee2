use crate::commands::markets::validate_asset_id;
use crate::error::AppError;
use crate::market::types::{Asset, Sourced};
use crate::state::AppState;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistToggleResult {
    pub id: String,
    pub watched: bool,
}

pub async fn watchlist_get(state: &AppState) -> Result<Vec<String>, AppError> {
    state.watchlist.ids().await
}

pub async fn watchlist_toggle(
    state: &AppState,
    id: String,
) -> Result<WatchlistToggleResult, AppError> {
    let id = validate_asset_id(&id)?.to_string();
    let watched = state.watchlist.toggle(&id).await?;
    Ok(WatchlistToggleResult { id, watched })
}

pub async fn watchlist_assets(state: &AppState) -> Result<Sourced<Vec<Asset>>, AppError> {
    let ids = state.watchlist.ids().await?;
    Ok(state.market_api.assets_by_ids(&ids).await)
}
