use std::fmt;

/// Owner of a portfolio (Telegram user id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HolderId(pub u64);

impl fmt::Display for HolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub token: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValuationLine {
    pub token: String,
    pub quantity: f64,
    // None when the price lookup failed
    pub unit_price: Option<f64>,
}

impl ValuationLine {
    pub fn value(&self) -> Option<f64> {
        self.unit_price.map(|p| p * self.quantity)
    }

    pub fn is_available(&self) -> bool {
        self.unit_price.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Valuation {
    pub lines: Vec<ValuationLine>,
    pub total: f64,
}

impl Valuation {
    pub fn from_lines(lines: Vec<ValuationLine>) -> Self {
        let total = lines.iter().filter_map(ValuationLine::value).sum();
        Self { lines, total }
    }

    pub fn unavailable(&self) -> impl Iterator<Item = &ValuationLine> {
        self.lines.iter().filter(|l| !l.is_available())
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
