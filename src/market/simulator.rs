use crate::market::random::{RandomSource, SharedRandom};
use crate::market::store::MarketStore;
use crate::market::types::{Asset, AssetPatch, SimulatorConfig, SPARKLINE_LEN};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

const PRICE_DRIFT: f64 = 0.005;
const CHANGE_DRIFT_POINTS: f64 = 0.2;
const VOLUME_DRIFT: f64 = 0.01;

pub fn compute_tick_patches(assets: &[Asset], rng: &mut dyn RandomSource) -> Vec<AssetPatch> {
    assets
        .iter()
        .map(|asset| {
            let price = asset.current_price * (1.0 + rng.uniform(-PRICE_DRIFT, PRICE_DRIFT));
            let change_1h =
                asset.price_change_pct_1h + rng.uniform(-CHANGE_DRIFT_POINTS, CHANGE_DRIFT_POINTS);
            let change_24h = asset.price_change_pct_24h
                + rng.uniform(-CHANGE_DRIFT_POINTS, CHANGE_DRIFT_POINTS);
            let change_7d =
                asset.price_change_pct_7d + rng.uniform(-CHANGE_DRIFT_POINTS, CHANGE_DRIFT_POINTS);
            let volume = asset.total_volume_24h * (1.0 + rng.uniform(-VOLUME_DRIFT, VOLUME_DRIFT));

            let sparkline_7d = (asset.sparkline_7d.len() == SPARKLINE_LEN).then(|| {
                let mut window = Vec::with_capacity(SPARKLINE_LEN);
                window.extend_from_slice(&asset.sparkline_7d[1..]);
                window.push(price);
                window
            });

            AssetPatch {
                current_price: Some(price),
                price_change_pct_1h: Some(change_1h),
                price_change_pct_24h: Some(change_24h),
                price_change_pct_7d: Some(change_7d),
                total_volume_24h: Some(volume),
                sparkline_7d,
                ..AssetPatch::new(asset.id.clone())
            }
        })
        .collect()
}

pub struct SimulatorHandle {
    config: SimulatorConfig,
    cancellation_token: CancellationToken,
    join_handle: Option<JoinHandle<()>>,
    tick_count: Arc<AtomicU64>,
}

impl SimulatorHandle {
    pub fn config(&self) -> SimulatorConfig {
        self.config
    }

    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.cancellation_token.is_cancelled()
            && self
                .join_handle
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    pub async fn stop(mut self) {
        self.cancellation_token.cancel();
        if let Some(join_handle) = self.join_handle.take() {
            let _ = join_handle.await;
        }
    }
}

impl Drop for SimulatorHandle {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

pub fn start_simulator(
    store: &Arc<MarketStore>,
    config: SimulatorConfig,
    rng: SharedRandom,
) -> SimulatorHandle {
    let cancellation_token = CancellationToken::new();
    let tick_count = Arc::new(AtomicU64::new(0));

    let join_handle = tokio::spawn(run_simulator(
        Arc::downgrade(store),
        config,
        rng,
        cancellation_token.clone(),
        Arc::clone(&tick_count),
    ));

    SimulatorHandle {
        config,
        cancellation_token,
        join_handle: Some(join_handle),
        tick_count,
    }
}

async fn run_simulator(
    store: Weak<MarketStore>,
    config: SimulatorConfig,
    rng: SharedRandom,
    cancel_token: CancellationToken,
    tick_count: Arc<AtomicU64>,
) {
    let period = Duration::from_millis(config.interval_ms.max(1));
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(interval_ms = config.interval_ms, "live update simulator started");

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => {
                let Some(store) = store.upgrade() else {
                    debug!("market store dropped, ending simulator");
                    break;
                };
                let applied = store.patch_with(|assets| {
                    let mut rng = rng.lock();
                    compute_tick_patches(assets, &mut *rng)
                });
                let tick = tick_count.fetch_add(1, Ordering::Relaxed) + 1;
                trace!(tick, asset_count = applied, "applied simulated tick");
            }
        }
    }

    info!(
        ticks = tick_count.load(Ordering::Relaxed),
        "live update simulator stopped"
    );
}
