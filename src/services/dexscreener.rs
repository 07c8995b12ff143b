use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::market_data::{MarketDataProvider, ProviderError};
use crate::models::{HoneypotReport, PairData, TokenRef, TxnCount, Windows};

pub const DEXSCREENER_URL: &str = "https://api.dexscreener.com";
pub const HONEYPOT_URL: &str = "https://api.honeypot.is";
const API_TIMEOUT_SECS: u64 = 15;

/// DexScreener pair search + honeypot.is simulation.
#[derive(Clone)]
pub struct DexScreenerClient {
    http: Client,
    dexscreener_url: String,
    honeypot_url: String,
}

impl DexScreenerClient {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_urls(DEXSCREENER_URL, HONEYPOT_URL)
    }

    pub fn with_base_urls(
        dexscreener_url: impl Into<String>,
        honeypot_url: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(API_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            dexscreener_url: dexscreener_url.into().trim_end_matches('/').to_string(),
            honeypot_url: honeypot_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let res = self.http.get(url).query(query).send().await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Transient(format!("{url} failed: {status} {body}")));
        }

        Ok(res.json::<T>().await?)
    }
}

#[async_trait]
impl MarketDataProvider for DexScreenerClient {
    async fn search_pair(&self, symbol: &str) -> Result<PairData, ProviderError> {
        let url = format!("{}/latest/dex/search", self.dexscreener_url);
        let res: SearchResponse = self.get_json(&url, &[("q", symbol)]).await?;

        res.pairs
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(DexPair::into_pair_data)
            .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))
    }

    async fn honeypot_check(&self, address: &str) -> Result<HoneypotReport, ProviderError> {
        let url = format!("{}/v2/IsHoneypot", self.honeypot_url);
        let res: HoneypotResponse = self.get_json(&url, &[("address", address)]).await?;

        let Some(result) = res.honeypot_result else {
            return Err(ProviderError::NotFound(address.to_string()));
        };

        let simulation = res.simulation_result.unwrap_or_default();
        Ok(HoneypotReport {
            is_honeypot: result.is_honeypot,
            holders: res.token.and_then(|t| t.total_holders),
            buy_tax: simulation.buy_tax,
            sell_tax: simulation.sell_tax,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    pairs: Option<Vec<DexPair>>,
}

#[derive(Debug, Deserialize)]
struct DexPair {
    #[serde(rename = "chainId", default)]
    chain_id: String,
    url: Option<String>,
    #[serde(rename = "baseToken")]
    base_token: BaseToken,
    // DexScreener sends prices as strings
    #[serde(rename = "priceUsd")]
    price_usd: Option<String>,
    #[serde(default)]
    txns: DexWindows<DexTxns>,
    #[serde(default)]
    volume: DexWindows<f64>,
    #[serde(rename = "priceChange", default)]
    price_change: DexWindows<f64>,
    liquidity: Option<Liquidity>,
    fdv: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct BaseToken {
    address: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct DexWindows<T> {
    m5: Option<T>,
    h1: Option<T>,
    h6: Option<T>,
    h24: Option<T>,
}

impl<T> Default for DexWindows<T> {
    fn default() -> Self {
        Self {
            m5: None,
            h1: None,
            h6: None,
            h24: None,
        }
    }
}

impl<T: Default> DexWindows<T> {
    fn into_windows<U>(self, f: impl Fn(T) -> U) -> Windows<U> {
        Windows {
            m5: f(self.m5.unwrap_or_default()),
            h1: f(self.h1.unwrap_or_default()),
            h6: f(self.h6.unwrap_or_default()),
            h24: f(self.h24.unwrap_or_default()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct DexTxns {
    #[serde(default)]
    buys: u64,
    #[serde(default)]
    sells: u64,
}

#[derive(Debug, Deserialize)]
struct Liquidity {
    usd: Option<f64>,
}

impl DexPair {
    fn into_pair_data(self) -> PairData {
        PairData {
            chain_id: self.chain_id,
            url: self.url,
            base_token: TokenRef {
                address: self.base_token.address,
                name: self.base_token.name,
                symbol: self.base_token.symbol,
            },
            price_usd: self.price_usd.and_then(|s| s.parse::<f64>().ok()),
            price_change: self.price_change.into_windows(|v| v),
            txns: self.txns.into_windows(|t| TxnCount {
                buys: t.buys,
                sells: t.sells,
            }),
            volume_h24: self.volume.h24.unwrap_or_default(),
            liquidity_usd: self.liquidity.and_then(|l| l.usd).unwrap_or_default(),
            fdv: self.fdv,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HoneypotResponse {
    token: Option<HoneypotToken>,
    #[serde(rename = "honeypotResult")]
    honeypot_result: Option<HoneypotResult>,
    #[serde(rename = "simulationResult")]
    simulation_result: Option<SimulationResult>,
}

#[derive(Debug, Deserialize)]
struct HoneypotToken {
    #[serde(rename = "totalHolders")]
    total_holders: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct HoneypotResult {
    #[serde(rename = "isHoneypot", default)]
    is_honeypot: bool,
}

#[derive(Debug, Default, Deserialize)]
struct SimulationResult {
    #[serde(rename = "buyTax")]
    buy_tax: Option<f64>,
    #[serde(rename = "sellTax")]
    sell_tax: Option<f64>,
}
