use crate::error::AppError;
use crate::market::random::SharedRandom;
use crate::market::simulator::start_simulator;
use crate::market::types::{
    SimulatorArgs, SimulatorSession, SimulatorState, SimulatorStatusSnapshot,
    SimulatorStopResult,
};
use crate::state::AppState;
use std::sync::Arc;

pub async fn start_live_updates(
    state: &AppState,
    args: Option<SimulatorArgs>,
) -> Result<SimulatorSession, AppError> {
    let config = match args {
        Some(args) => args.normalize()?,
        None => state.config.simulator,
    };

    let existing_handle = {
        let mut simulator_slot = state.simulator.lock().await;
        simulator_slot.take()
    };
    if let Some(handle) = existing_handle {
        handle.stop().await;
    }

    let rng: SharedRandom = Arc::clone(&state.rng);
    let handle = start_simulator(&state.market_store, config, rng);

    {
        let mut simulator_slot = state.simulator.lock().await;
        *simulator_slot = Some(handle);
    }

    {
        let mut writable = state.simulator_status.write().await;
        *writable = SimulatorStatusSnapshot {
            state: SimulatorState::Running,
            interval_ms: config.interval_ms,
            tick_count: 0,
            reason: None,
        };
    }

    Ok(SimulatorSession::from_config(&config))
}

pub async fn stop_live_updates(state: &AppState) -> Result<SimulatorStopResult, AppError> {
    let existing_handle = {
        let mut simulator_slot = state.simulator.lock().await;
        simulator_slot.take()
    };

    let final_tick_count = match existing_handle {
        Some(handle) => {
            let ticks = handle.tick_count();
            handle.stop().await;
            Some(ticks)
        }
        None => None,
    };

    {
        let mut writable = state.simulator_status.write().await;
        writable.state = SimulatorState::Stopped;
        if let Some(ticks) = final_tick_count {
            writable.tick_count = ticks;
        }
        writable.reason = Some("live updates stopped by command".to_string());
    }

    Ok(SimulatorStopResult {
        stopped: final_tick_count.is_some(),
    })
}

pub async fn live_updates_status(state: &AppState) -> Result<SimulatorStatusSnapshot, AppError> {
    let mut snapshot = state.simulator_status.read().await.clone();

    let simulator_slot = state.simulator.lock().await;
    if let Some(handle) = simulator_slot.as_ref() {
        snapshot.tick_count = handle.tick_count();
        if !handle.is_running() {
            snapshot.state = SimulatorState::Stopped;
            snapshot.reason = Some("live updates ended".to_string());
        }
    }

    Ok(snapshot)
}
