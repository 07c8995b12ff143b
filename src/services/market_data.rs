//! Provider seams for market, honeypot and gas data.
//!
//! Everything that leaves the process for third-party data goes through these
//! traits so the scheduler and command handlers can be exercised with fakes.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{GasOracle, HoneypotReport, PairData, TokenSnapshot};

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("provider unavailable: {0}")]
    Transient(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ProviderError::Decode(e.to_string())
        } else {
            ProviderError::Transient(e.to_string())
        }
    }
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Best trading pair for a free-form symbol.
    async fn search_pair(&self, symbol: &str) -> Result<PairData, ProviderError>;

    /// Honeypot simulation for a token contract.
    async fn honeypot_check(&self, address: &str) -> Result<HoneypotReport, ProviderError>;

    /// Pair lookup followed by the honeypot check on its base token.
    async fn fetch(&self, symbol: &str) -> Result<TokenSnapshot, ProviderError> {
        let pair = self.search_pair(symbol).await?;
        let honeypot = self.honeypot_check(&pair.base_token.address).await?;
        Ok(TokenSnapshot::new(pair, honeypot))
    }

    async fn price_usd(&self, symbol: &str) -> Result<f64, ProviderError> {
        let pair = self.search_pair(symbol).await?;
        match pair.price_usd {
            Some(p) if p.is_finite() && p >= 0.0 => Ok(p),
            _ => Err(ProviderError::NotFound(format!("no USD price for {symbol}"))),
        }
    }
}

#[async_trait]
pub trait GasTrackerProvider: Send + Sync {
    async fn fetch(&self) -> Result<GasOracle, ProviderError>;
}
