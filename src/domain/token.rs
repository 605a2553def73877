//! Token Data Model
//!
//! Candidate listings, safety reports and enrichment metrics. The contract
//! address is the only join key between the three.

use serde::{Deserialize, Serialize};

/// Minimum number of price samples before a trend is computed
pub const MIN_TREND_SAMPLES: usize = 5;

/// Category tag used for operator-submitted tokens
pub const MANUAL_CATEGORY: &str = "manual";

/// A token discovered on a listing feed
///
/// Immutable once constructed; the filter chain only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCandidate {
    /// Contract address (unique key)
    pub id: String,
    /// Token symbol
    #[serde(default)]
    pub symbol: String,
    /// Token name
    #[serde(default)]
    pub name: String,
    /// Current price in USD
    #[serde(default)]
    pub price: f64,
    /// 24-hour trading volume in USD
    #[serde(default)]
    pub volume_24h: f64,
    /// Pool liquidity in USD, `None` when the feed did not report it
    #[serde(default)]
    pub liquidity: Option<f64>,
    /// Total token supply, `None` when the feed did not report it
    #[serde(default)]
    pub total_supply: Option<f64>,
    /// 24-hour price change percentage
    #[serde(default)]
    pub price_change_24h: f64,
    /// Developer/deployer wallet, if known
    #[serde(default)]
    pub dev_wallet: Option<String>,
    /// Feed category this listing came from
    #[serde(default)]
    pub category: String,
}

impl TokenCandidate {
    /// Create a candidate with no market data
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: String::new(),
            price: 0.0,
            volume_24h: 0.0,
            liquidity: None,
            total_supply: None,
            price_change_24h: 0.0,
            dev_wallet: None,
            category: category.into(),
        }
    }

    /// Bare candidate for an operator-submitted contract address
    pub fn manual(id: impl Into<String>) -> Self {
        Self::new(id, "", MANUAL_CATEGORY)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = non_negative(price);
        self
    }

    pub fn with_volume(mut self, volume_24h: f64) -> Self {
        self.volume_24h = non_negative(volume_24h);
        self
    }

    pub fn with_liquidity(mut self, liquidity: f64) -> Self {
        self.liquidity = Some(non_negative(liquidity));
        self
    }

    pub fn with_total_supply(mut self, total_supply: f64) -> Self {
        self.total_supply = Some(non_negative(total_supply));
        self
    }

    pub fn with_price_change(mut self, pct: f64) -> Self {
        self.price_change_24h = if pct.is_finite() { pct } else { 0.0 };
        self
    }

    pub fn with_dev_wallet(mut self, wallet: impl Into<String>) -> Self {
        self.dev_wallet = Some(wallet.into());
        self
    }

    /// Label used in log lines and notifications
    pub fn display_name(&self) -> &str {
        if !self.symbol.is_empty() {
            &self.symbol
        } else if !self.name.is_empty() {
            &self.name
        } else {
            &self.id
        }
    }
}

/// Safety verdict reported by the safety-report service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SafetyStatus {
    Good,
    Bad,
    Unknown,
}

impl SafetyStatus {
    /// Parse a provider status string, case-insensitively
    ///
    /// Anything that is not recognisably good or bad is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GOOD" => SafetyStatus::Good,
            "BAD" | "DANGER" | "RUGGED" => SafetyStatus::Bad,
            _ => SafetyStatus::Unknown,
        }
    }

    pub fn is_good(&self) -> bool {
        matches!(self, SafetyStatus::Good)
    }
}

impl std::fmt::Display for SafetyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SafetyStatus::Good => write!(f, "GOOD"),
            SafetyStatus::Bad => write!(f, "BAD"),
            SafetyStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Third-party rug/scam assessment, fetched fresh per evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyReport {
    pub token_id: String,
    /// Token name as reported by the safety service
    #[serde(default)]
    pub name: Option<String>,
    pub status: SafetyStatus,
    /// Provider risk score
    pub risk_score: f64,
}

impl SafetyReport {
    pub fn new(token_id: impl Into<String>, status: SafetyStatus, risk_score: f64) -> Self {
        Self {
            token_id: token_id.into(),
            name: None,
            status,
            risk_score: if risk_score.is_finite() { risk_score } else { 0.0 },
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Holder/volume/price data from the metrics service
///
/// Missing provider fields default to zero or empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichedMetrics {
    pub token_id: String,
    pub top_holders: u64,
    /// Trailing trading volume in USD
    pub trading_volume: f64,
    /// Oldest first
    pub price_history: Vec<f64>,
    pub liquidity: Option<f64>,
    pub total_supply: Option<f64>,
}

impl EnrichedMetrics {
    /// Empty metrics for a token whose enrichment failed
    pub fn empty(token_id: impl Into<String>) -> Self {
        Self {
            token_id: token_id.into(),
            ..Default::default()
        }
    }

    /// Percentage price trend over the history
    pub fn price_trend(&self) -> f64 {
        price_trend(&self.price_history)
    }
}

/// Percentage change from the first to the last sample
///
/// Returns exactly 0.0 when there are fewer than [`MIN_TREND_SAMPLES`]
/// samples, when the first sample is zero, or when the result is not finite.
pub fn price_trend(history: &[f64]) -> f64 {
    if history.len() < MIN_TREND_SAMPLES {
        return 0.0;
    }
    let first = history[0];
    let last = history[history.len() - 1];
    if first == 0.0 {
        return 0.0;
    }
    let trend = (last - first) / first * 100.0;
    if trend.is_finite() {
        trend
    } else {
        0.0
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
