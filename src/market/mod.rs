pub mod api;
pub mod chart;
pub mod coingecko;
pub mod fallback;
pub mod fetch;
pub mod preferences;
pub mod random;
pub mod simulator;
pub mod store;
pub mod types;
