use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures_util::future::join_all;
use thiserror::Error;
use tracing::debug;

use super::market_data::MarketDataProvider;
use crate::models::{HolderId, Holding, Valuation, ValuationLine};

// Remainders this small relative to the holding count as fully removed.
const DUST_RATIO: f64 = 1e-12;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortfolioError {
    #[error("quantity must be a positive number, got {0}")]
    InvalidQuantity(f64),
    #[error("you don't hold any {0}")]
    NotHeld(String),
    #[error("you only hold {held} {token}, cannot remove {requested}")]
    Insufficient {
        token: String,
        held: f64,
        requested: f64,
    },
}

/// In-memory token holdings per user.
#[derive(Default)]
pub struct PortfolioStore {
    holdings: Mutex<HashMap<HolderId, BTreeMap<String, f64>>>,
}

fn validate_quantity(quantity: f64) -> Result<f64, PortfolioError> {
    if quantity.is_finite() && quantity > 0.0 {
        Ok(quantity)
    } else {
        Err(PortfolioError::InvalidQuantity(quantity))
    }
}

impl PortfolioStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<HolderId, BTreeMap<String, f64>>> {
        self.holdings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds to the holding and returns the new amount.
    pub fn add(&self, holder: HolderId, token: &str, quantity: f64) -> Result<f64, PortfolioError> {
        let quantity = validate_quantity(quantity)?;

        let mut all = self.lock();
        let held = all.entry(holder).or_default().entry(token.to_string()).or_insert(0.0);
        *held += quantity;
        Ok(*held)
    }

    /// Removes from the holding and returns what is left; the entry is
    /// deleted once nothing remains.
    pub fn remove(&self, holder: HolderId, token: &str, quantity: f64) -> Result<f64, PortfolioError> {
        let quantity = validate_quantity(quantity)?;

        let mut all = self.lock();
        let Some(tokens) = all.get_mut(&holder) else {
            return Err(PortfolioError::NotHeld(token.to_string()));
        };
        let Some(held) = tokens.get(token).copied() else {
            return Err(PortfolioError::NotHeld(token.to_string()));
        };

        if quantity > held {
            return Err(PortfolioError::Insufficient {
                token: token.to_string(),
                held,
                requested: quantity,
            });
        }

        let remaining = held - quantity;
        if remaining <= held * DUST_RATIO {
            tokens.remove(token);
            if tokens.is_empty() {
                all.remove(&holder);
            }
            return Ok(0.0);
        }

        tokens.insert(token.to_string(), remaining);
        Ok(remaining)
    }

    pub fn quantity(&self, holder: HolderId, token: &str) -> Option<f64> {
        self.lock().get(&holder).and_then(|t| t.get(token).copied())
    }

    /// Holdings sorted by token.
    pub fn holdings(&self, holder: HolderId) -> Vec<Holding> {
        self.lock()
            .get(&holder)
            .map(|tokens| {
                tokens
                    .iter()
                    .map(|(token, quantity)| Holding {
                        token: token.clone(),
                        quantity: *quantity,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Prices every holding concurrently. Failed lookups are kept as
    /// unavailable lines and left out of the total.
    pub async fn valuate(&self, holder: HolderId, provider: &dyn MarketDataProvider) -> Valuation {
        // snapshot first, never hold the lock across network calls
        let holdings = self.holdings(holder);

        let prices = join_all(holdings.iter().map(|h| provider.price_usd(&h.token))).await;

        let lines = holdings
            .into_iter()
            .zip(prices)
            .map(|(h, price)| {
                let unit_price = match price {
                    Ok(p) => Some(p),
                    Err(e) => {
                        debug!(holder = %holder, token = %h.token, error = %e, "price unavailable");
                        None
                    }
                };
                ValuationLine {
                    token: h.token,
                    quantity: h.quantity,
                    unit_price,
                }
            })
            .collect();

        Valuation::from_lines(lines)
    }
}
