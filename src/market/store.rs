use crate::market::types::{Asset, AssetPatch, FilterConfig, SortBy};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct StoreInner {
    assets: Vec<Asset>,
    index: HashMap<String, usize>,
    filters: FilterConfig,
    is_loading: bool,
}

impl StoreInner {
    fn apply(&mut self, patches: &[AssetPatch]) -> usize {
        let mut applied = 0;
        for patch in patches {
            if let Some(&position) = self.index.get(&patch.id) {
                patch.apply_to(&mut self.assets[position]);
                applied += 1;
            }
        }
        applied
    }
}

/// Canonical in-memory asset fleet. Each mutation takes the writer lock once, so a
/// reader sees either none or all of a batch.
#[derive(Debug, Default)]
pub struct MarketStore {
    inner: RwLock<StoreInner>,
}

impl MarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filters(filters: FilterConfig) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                filters,
                ..Default::default()
            }),
        }
    }

    pub fn replace_all(&self, assets: Vec<Asset>) {
        let mut index = HashMap::with_capacity(assets.len());
        for (position, asset) in assets.iter().enumerate() {
            index.entry(asset.id.clone()).or_insert(position);
        }

        let mut inner = self.inner.write();
        inner.assets = assets;
        inner.index = index;
    }

    pub fn patch_many(&self, patches: &[AssetPatch]) -> usize {
        self.inner.write().apply(patches)
    }

    pub fn patch_with(&self, build: impl FnOnce(&[Asset]) -> Vec<AssetPatch>) -> usize {
        let mut inner = self.inner.write();
        let patches = build(&inner.assets);
        inner.apply(&patches)
    }

    pub fn set_filters(&self, filters: FilterConfig) {
        self.inner.write().filters = filters;
    }

    pub fn filters(&self) -> FilterConfig {
        self.inner.read().filters.clone()
    }

    pub fn set_loading(&self, is_loading: bool) {
        self.inner.write().is_loading = is_loading;
    }

    pub fn is_loading(&self) -> bool {
        self.inner.read().is_loading
    }

    pub fn len(&self) -> usize {
        self.inner.read().assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().assets.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Asset> {
        self.inner.read().assets.clone()
    }

    pub fn select_by_id(&self, id: &str) -> Option<Asset> {
        let inner = self.inner.read();
        inner
            .index
            .get(id)
            .and_then(|&position| inner.assets.get(position))
            .cloned()
    }

    pub fn select_visible(&self) -> Vec<Asset> {
        let inner = self.inner.read();
        inner
            .assets
            .iter()
            .filter(|asset| inner.filters.matches(asset))
            .cloned()
            .collect()
    }

    pub fn select_visible_sorted(&self) -> Vec<Asset> {
        let (mut visible, sort_by) = {
            let inner = self.inner.read();
            let visible: Vec<Asset> = inner
                .assets
                .iter()
                .filter(|asset| inner.filters.matches(asset))
                .cloned()
                .collect();
            (visible, inner.filters.sort_by)
        };
        sort_assets(&mut visible, sort_by);
        visible
    }
}

pub fn sort_assets(assets: &mut [Asset], sort_by: SortBy) {
    match sort_by {
        SortBy::MarketCapDesc => assets.sort_by(|a, b| b.market_cap.total_cmp(&a.market_cap)),
        SortBy::MarketCapAsc => assets.sort_by(|a, b| a.market_cap.total_cmp(&b.market_cap)),
        SortBy::PriceDesc => assets.sort_by(|a, b| b.current_price.total_cmp(&a.current_price)),
        SortBy::PriceAsc => assets.sort_by(|a, b| a.current_price.total_cmp(&b.current_price)),
        SortBy::VolumeDesc => {
            assets.sort_by(|a, b| b.total_volume_24h.total_cmp(&a.total_volume_24h))
        }
        SortBy::PctChange24hDesc => {
            assets.sort_by(|a, b| b.price_change_pct_24h.total_cmp(&a.price_change_pct_24h))
        }
        SortBy::PctChange24hAsc => {
            assets.sort_by(|a, b| a.price_change_pct_24h.total_cmp(&b.price_change_pct_24h))
        }
    }
}

pub fn search_assets(assets: Vec<Asset>, term: &str) -> Vec<Asset> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return assets;
    }

    assets
        .into_iter()
        .filter(|asset| {
            asset.name.to_lowercase().contains(&needle)
                || asset.symbol.to_lowercase().contains(&needle)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TableSortField {
    Rank,
    Name,
    Price,
    Change1h,
    Change24h,
    Change7d,
    MarketCap,
    Volume24h,
    CirculatingSupply,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TableSort {
    pub field: TableSortField,
    pub direction: SortDirection,
}

impl Default for TableSort {
    fn default() -> Self {
        Self {
            field: TableSortField::Rank,
            direction: SortDirection::Asc,
        }
    }
}

impl TableSort {
    pub fn toggle(self, field: TableSortField) -> Self {
        if self.field == field {
            let direction = match self.direction {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => SortDirection::Asc,
            };
            Self { field, direction }
        } else {
            Self {
                field,
                direction: SortDirection::Asc,
            }
        }
    }

    pub fn apply(&self, assets: &mut [Asset]) {
        let field = self.field;
        let descending = self.direction == SortDirection::Desc;
        assets.sort_by(|a, b| {
            let ordering = compare_field(a, b, field);
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }
}

fn compare_field(a: &Asset, b: &Asset, field: TableSortField) -> Ordering {
    match field {
        TableSortField::Rank => a.market_cap_rank.cmp(&b.market_cap_rank),
        TableSortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        TableSortField::Price => a.current_price.total_cmp(&b.current_price),
        TableSortField::Change1h => a.price_change_pct_1h.total_cmp(&b.price_change_pct_1h),
        TableSortField::Change24h => a.price_change_pct_24h.total_cmp(&b.price_change_pct_24h),
        TableSortField::Change7d => a.price_change_pct_7d.total_cmp(&b.price_change_pct_7d),
        TableSortField::MarketCap => a.market_cap.total_cmp(&b.market_cap),
        TableSortField::Volume24h => a.total_volume_24h.total_cmp(&b.total_volume_24h),
        TableSortField::CirculatingSupply => a.circulating_supply.total_cmp(&b.circulating_supply),
    }
}
