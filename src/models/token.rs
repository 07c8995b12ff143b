use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenRef {
    pub address: String,
    pub name: String,
    pub symbol: String,
}

/// Values reported per time window (5m / 1h / 6h / 24h).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Windows<T> {
    pub m5: T,
    pub h1: T,
    pub h6: T,
    pub h24: T,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnCount {
    pub buys: u64,
    pub sells: u64,
}

/// Most liquid trading pair found for a symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairData {
    pub chain_id: String,
    pub url: Option<String>,
    pub base_token: TokenRef,
    pub price_usd: Option<f64>,
    pub price_change: Windows<f64>,
    pub txns: Windows<TxnCount>,
    pub volume_h24: f64,
    pub liquidity_usd: f64,
    pub fdv: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HoneypotReport {
    pub is_honeypot: bool,
    pub holders: Option<u64>,
    pub buy_tax: Option<f64>,
    pub sell_tax: Option<f64>,
}

/// Point-in-time market and risk data for one token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenSnapshot {
    pub pair: PairData,
    pub honeypot: HoneypotReport,
}

impl TokenSnapshot {
    pub fn new(pair: PairData, honeypot: HoneypotReport) -> Self {
        Self { pair, honeypot }
    }
}
