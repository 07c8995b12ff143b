use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::market_data::{GasTrackerProvider, ProviderError};
use crate::models::GasOracle;

pub const ETHERSCAN_URL: &str = "https://api.etherscan.io";
const API_TIMEOUT_SECS: u64 = 15;

#[derive(Clone)]
pub struct EtherscanGasTracker {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl EtherscanGasTracker {
    pub fn new(api_key: Option<String>) -> Result<Self, ProviderError> {
        Self::with_base_url(ETHERSCAN_URL, api_key)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(API_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }
}

#[async_trait]
impl GasTrackerProvider for EtherscanGasTracker {
    async fn fetch(&self) -> Result<GasOracle, ProviderError> {
        let url = format!("{}/api", self.base_url);
        let mut query = vec![("module", "gastracker"), ("action", "gasoracle")];
        // keyless calls work but are heavily throttled
        if let Some(key) = &self.api_key {
            query.push(("apikey", key.as_str()));
        }

        let res = self.http.get(&url).query(&query).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Transient(format!("Etherscan gas oracle failed: {status} {body}")));
        }

        res.json::<GasOracleResponse>().await?.into_oracle()
    }
}

#[derive(Debug, Deserialize)]
struct GasOracleResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: serde_json::Value,
}

// Etherscan encodes every number as a string.
#[derive(Debug, Deserialize)]
struct GasOracleResult {
    #[serde(rename = "LastBlock")]
    last_block: String,
    #[serde(rename = "SafeGasPrice")]
    safe_gas_price: String,
    #[serde(rename = "ProposeGasPrice")]
    propose_gas_price: String,
    #[serde(rename = "FastGasPrice")]
    fast_gas_price: String,
    #[serde(rename = "suggestBaseFee")]
    suggest_base_fee: String,
}

impl GasOracleResponse {
    fn into_oracle(self) -> Result<GasOracle, ProviderError> {
        if self.status != "1" {
            // on errors `result` holds a human-readable reason
            let reason = self.result.as_str().unwrap_or_default();
            return Err(ProviderError::Transient(format!("{} {}", self.message, reason).trim().to_string()));
        }

        let r: GasOracleResult =
            serde_json::from_value(self.result).map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(GasOracle {
            last_block: parse_field("LastBlock", &r.last_block)?,
            safe_gas_price: parse_field("SafeGasPrice", &r.safe_gas_price)?,
            propose_gas_price: parse_field("ProposeGasPrice", &r.propose_gas_price)?,
            fast_gas_price: parse_field("FastGasPrice", &r.fast_gas_price)?,
            suggested_base_fee: parse_field("suggestBaseFee", &r.suggest_base_fee)?,
        })
    }
}

fn parse_field<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ProviderError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ProviderError::Decode(format!("{name}: {raw:?}")))
}
