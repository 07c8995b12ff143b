//! Handlebars registry and view models for the HTML chat messages.

use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;
use std::sync::Arc;

use crate::models::{GasOracle, TokenSnapshot, TxnCount, Valuation};

pub type Hbs = Arc<Handlebars<'static>>;

pub const TOKEN_REPORT: &str = "messages/token_report";
pub const GAS_REPORT: &str = "messages/gas_report";
pub const PORTFOLIO: &str = "messages/portfolio";

pub fn build_handlebars() -> Result<Hbs, TemplateError> {
    let mut hb = Handlebars::new();
    hb.register_escape_fn(esc);

    hb.register_template_string(TOKEN_REPORT, include_str!("../templates/messages/token_report.hbs"))?;
    hb.register_template_string(GAS_REPORT, include_str!("../templates/messages/gas_report.hbs"))?;
    hb.register_template_string(PORTFOLIO, include_str!("../templates/messages/portfolio.hbs"))?;

    Ok(Arc::new(hb))
}

/// Telegram's HTML mode only understands a handful of entities.
pub fn esc(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Format price with precision based on magnitude.
pub fn format_price(price: f64) -> String {
    if price == 0.0 {
        return "$0".to_string();
    }
    let abs_price = price.abs();
    if abs_price >= 1000.0 {
        format!("${:.2}", price)
    } else if abs_price >= 1.0 {
        format!("${:.4}", price)
    } else if abs_price >= 0.01 {
        format!("${:.6}", price)
    } else if abs_price >= 0.0001 {
        format!("${:.8}", price)
    } else {
        format!("${:.10}", price)
    }
}

pub fn format_usd(amount: f64) -> String {
    format!("${:.2}", amount)
}

pub fn format_quantity(q: f64) -> String {
    // drop float noise such as 0.30000000000000004
    let s = format!("{:.8}", q);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn change_emoji(pct: f64) -> &'static str {
    if pct >= 0.0 { "📈" } else { "📉" }
}

#[derive(Debug, Serialize)]
struct ChangeView {
    label: &'static str,
    emoji: &'static str,
    value: String,
}

#[derive(Debug, Serialize)]
struct TxnView {
    label: &'static str,
    buys: u64,
    sells: u64,
}

#[derive(Debug, Serialize)]
struct TokenReportView {
    url: String,
    name: String,
    symbol: String,
    chain: String,
    price: String,
    holders: String,
    buy_tax: String,
    sell_tax: String,
    changes: Vec<ChangeView>,
    volume_24h: String,
    liquidity: String,
    fdv: Option<String>,
    honeypot: &'static str,
    txns: Vec<TxnView>,
}

impl TokenReportView {
    fn from_snapshot(s: &TokenSnapshot) -> Self {
        let pair = &s.pair;
        let pct = |v: Option<f64>| v.map(|v| format!("{v}%")).unwrap_or_else(|| "N/A".to_string());
        let change = |label, v: f64| ChangeView {
            label,
            emoji: change_emoji(v),
            value: format!("{v:.2}%"),
        };
        let txn = |label, t: TxnCount| TxnView {
            label,
            buys: t.buys,
            sells: t.sells,
        };

        Self {
            url: pair
                .url
                .clone()
                .unwrap_or_else(|| format!("https://dexscreener.com/search?q={}", pair.base_token.address)),
            name: pair.base_token.name.clone(),
            symbol: pair.base_token.symbol.clone(),
            chain: pair.chain_id.clone(),
            price: pair.price_usd.map(format_price).unwrap_or_else(|| "N/A".to_string()),
            holders: s
                .honeypot
                .holders
                .map(|h| h.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            buy_tax: pct(s.honeypot.buy_tax),
            sell_tax: pct(s.honeypot.sell_tax),
            changes: vec![
                change("5min", pair.price_change.m5),
                change("1h", pair.price_change.h1),
                change("24h", pair.price_change.h24),
            ],
            volume_24h: format_usd(pair.volume_h24),
            liquidity: format_usd(pair.liquidity_usd),
            fdv: pair.fdv.filter(|v| *v > 0.0).map(format_usd),
            honeypot: if s.honeypot.is_honeypot { "Yes" } else { "No" },
            txns: vec![
                txn("5m", pair.txns.m5),
                txn("1h", pair.txns.h1),
                txn("6h", pair.txns.h6),
                txn("24h", pair.txns.h24),
            ],
        }
    }
}

pub fn render_token_report(hbs: &Hbs, snapshot: &TokenSnapshot) -> Result<String, RenderError> {
    hbs.render(TOKEN_REPORT, &TokenReportView::from_snapshot(snapshot))
}

#[derive(Debug, Serialize)]
struct GasReportView {
    last_block: u64,
    safe: String,
    propose: String,
    fast: String,
    base_fee: String,
}

pub fn render_gas_report(hbs: &Hbs, oracle: &GasOracle) -> Result<String, RenderError> {
    let view = GasReportView {
        last_block: oracle.last_block,
        safe: format!("{}", oracle.safe_gas_price),
        propose: format!("{}", oracle.propose_gas_price),
        fast: format!("{}", oracle.fast_gas_price),
        base_fee: format!("{:.3}", oracle.suggested_base_fee),
    };
    hbs.render(GAS_REPORT, &view)
}

#[derive(Debug, Serialize)]
struct ValuationLineView {
    token: String,
    quantity: String,
    price: Option<String>,
    value: Option<String>,
}

#[derive(Debug, Serialize)]
struct PortfolioView {
    lines: Vec<ValuationLineView>,
    total: String,
    unpriced: usize,
}

pub fn render_portfolio(hbs: &Hbs, valuation: &Valuation) -> Result<String, RenderError> {
    let view = PortfolioView {
        lines: valuation
            .lines
            .iter()
            .map(|l| ValuationLineView {
                token: l.token.clone(),
                quantity: format_quantity(l.quantity),
                price: l.unit_price.map(format_price),
                value: l.value().map(format_usd),
            })
            .collect(),
        total: format_usd(valuation.total),
        unpriced: valuation.unavailable().count(),
    };
    hbs.render(PORTFOLIO, &view)
}
