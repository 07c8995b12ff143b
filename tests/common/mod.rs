#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cryptoverse::{
    AppState, config,
    models::{Destination, GasOracle, HoneypotReport, PairData, TokenRef},
    services::{
        market_data::{GasTrackerProvider, MarketDataProvider, ProviderError},
        notifier::{Notifier, NotifyError, SendOptions},
    },
    templates,
};

/// Market provider serving fixed prices; unknown symbols are not found.
#[derive(Default)]
pub struct FakeMarket {
    prices: HashMap<String, f64>,
    failures_left: AtomicUsize,
    panics_left: AtomicUsize,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeMarket {
    pub fn with_prices(prices: &[(&str, f64)]) -> Self {
        Self {
            prices: prices.iter().map(|(s, p)| (s.to_string(), *p)).collect(),
            ..Default::default()
        }
    }

    /// The next `n` lookups fail with a transient error.
    pub fn failing_first(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    /// The next `n` lookups panic.
    pub fn panicking_first(self, n: usize) -> Self {
        self.panics_left.store(n, Ordering::SeqCst);
        self
    }

    /// Every lookup takes `delay` before answering.
    pub fn slow(self, delay: Duration) -> Self {
        Self { delay, ..self }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of lookups seen running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

pub fn pair(symbol: &str, price: f64) -> PairData {
    PairData {
        chain_id: "ethereum".to_string(),
        url: Some(format!("https://dexscreener.com/ethereum/{symbol}")),
        base_token: TokenRef {
            address: format!("0x{symbol}"),
            name: format!("{symbol} Token"),
            symbol: symbol.to_string(),
        },
        price_usd: Some(price),
        liquidity_usd: 10_000.0,
        ..Default::default()
    }
}

#[async_trait]
impl MarketDataProvider for FakeMarket {
    async fn search_pair(&self, symbol: &str) -> Result<PairData, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if take_one(&self.panics_left) {
            panic!("market provider blew up");
        }
        if take_one(&self.failures_left) {
            return Err(ProviderError::Transient("upstream 502".to_string()));
        }

        if !self.delay.is_zero() {
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        self.prices
            .get(symbol)
            .map(|p| pair(symbol, *p))
            .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))
    }

    async fn honeypot_check(&self, _address: &str) -> Result<HoneypotReport, ProviderError> {
        Ok(HoneypotReport {
            is_honeypot: false,
            holders: Some(100),
            buy_tax: Some(0.0),
            sell_tax: Some(0.0),
        })
    }
}

pub struct FakeGas {
    pub oracle: Option<GasOracle>,
}

#[async_trait]
impl GasTrackerProvider for FakeGas {
    async fn fetch(&self) -> Result<GasOracle, ProviderError> {
        self.oracle
            .clone()
            .ok_or_else(|| ProviderError::Transient("NOTOK Max rate limit reached".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sent {
    pub destination: Destination,
    pub text: String,
    pub options: SendOptions,
}

/// Notifier that records every message instead of delivering it.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, destination: Destination) -> usize {
        self.sent().iter().filter(|s| s.destination == destination).count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        destination: Destination,
        text: &str,
        options: SendOptions,
    ) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Delivery("chat not found".to_string()));
        }
        self.sent.lock().unwrap().push(Sent {
            destination,
            text: text.to_string(),
            options,
        });
        Ok(())
    }
}

pub fn test_settings() -> config::Settings {
    config::Settings {
        host: "127.0.0.1".to_string(),
        port: 0,
        bot_token: "123:test".to_string(),
        etherscan_api_key: None,
        static_dir: "static".to_string(),
    }
}

pub fn test_state(market: Arc<FakeMarket>, notifier: Arc<RecordingNotifier>) -> AppState {
    test_state_with_gas(market, notifier, None)
}

pub fn test_state_with_gas(
    market: Arc<FakeMarket>,
    notifier: Arc<RecordingNotifier>,
    oracle: Option<GasOracle>,
) -> AppState {
    AppState::new(
        test_settings(),
        templates::build_handlebars().expect("templates"),
        market,
        Arc::new(FakeGas { oracle }),
        notifier,
    )
}
