pub mod app_info;
pub mod health;
pub mod live_updates;
pub mod markets;
pub mod watchlist;
