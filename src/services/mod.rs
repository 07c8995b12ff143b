pub mod market_data;
pub mod dexscreener;
pub mod etherscan;
pub mod notifier;

pub mod alert_job;
pub mod alert_registry;
pub mod portfolio_service;
