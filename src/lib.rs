//! Library entrypoint for the CryptoVerse bot.
//!
//! `main.rs` only wires real providers into `AppState`; everything else lives
//! here so integration tests under `tests/` can build the state with fakes.

use std::sync::Arc;

pub mod config;
pub mod models;
pub mod services;
pub mod templates;

pub mod controllers;
pub mod routes;

use services::{
    alert_job::JobContext,
    alert_registry::AlertRegistry,
    market_data::{GasTrackerProvider, MarketDataProvider},
    notifier::Notifier,
    portfolio_service::PortfolioStore,
};

#[derive(Clone)]
pub struct AppState {
    pub hbs: templates::Hbs,
    pub settings: config::Settings,
    pub market: Arc<dyn MarketDataProvider>,
    pub gas: Arc<dyn GasTrackerProvider>,
    pub notifier: Arc<dyn Notifier>,
    pub alerts: Arc<AlertRegistry>,
    pub portfolios: Arc<PortfolioStore>,
}

impl AppState {
    pub fn new(
        settings: config::Settings,
        hbs: templates::Hbs,
        market: Arc<dyn MarketDataProvider>,
        gas: Arc<dyn GasTrackerProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let alerts = AlertRegistry::new(JobContext {
            provider: market.clone(),
            notifier: notifier.clone(),
            hbs: hbs.clone(),
        });

        Self {
            hbs,
            settings,
            market,
            gas,
            notifier,
            alerts: Arc::new(alerts),
            portfolios: Arc::new(PortfolioStore::new()),
        }
    }
}
