use std::{fmt, str::FromStr, time::Duration};

use thiserror::Error;

/// Chat that receives notifications (Telegram chat id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Destination(pub i64);

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one recurring subscription.
///
/// Tokens are kept exactly as typed, so `eth` and `ETH` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlertKey {
    pub destination: Destination,
    pub token: String,
}

impl AlertKey {
    pub fn new(destination: Destination, token: impl Into<String>) -> Self {
        Self {
            destination,
            token: token.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported interval: {0}")]
pub struct InvalidInterval(pub String);

/// Supported alert cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertInterval {
    ThirtySeconds,
    OneMinute,
    FiveMinutes,
    ThirtyMinutes,
    OneHour,
}

impl AlertInterval {
    pub const ALL: [AlertInterval; 5] = [
        AlertInterval::ThirtySeconds,
        AlertInterval::OneMinute,
        AlertInterval::FiveMinutes,
        AlertInterval::ThirtyMinutes,
        AlertInterval::OneHour,
    ];

    pub fn as_secs(self) -> u64 {
        match self {
            AlertInterval::ThirtySeconds => 30,
            AlertInterval::OneMinute => 60,
            AlertInterval::FiveMinutes => 300,
            AlertInterval::ThirtyMinutes => 1800,
            AlertInterval::OneHour => 3600,
        }
    }

    pub fn period(self) -> Duration {
        Duration::from_secs(self.as_secs())
    }

    /// The literal users type in `/alert`.
    pub fn literal(self) -> &'static str {
        match self {
            AlertInterval::ThirtySeconds => "30s",
            AlertInterval::OneMinute => "1m",
            AlertInterval::FiveMinutes => "5m",
            AlertInterval::ThirtyMinutes => "30m",
            AlertInterval::OneHour => "1h",
        }
    }

    pub fn literals() -> String {
        Self::ALL
            .iter()
            .map(|i| i.literal())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for AlertInterval {
    type Err = InvalidInterval;

    // exact, case-sensitive match
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|i| i.literal() == s)
            .ok_or_else(|| InvalidInterval(s.to_string()))
    }
}

impl fmt::Display for AlertInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.literal())
    }
}
