use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default lower bound for a buy, in settlement currency
pub const MIN_BUY_AMOUNT: Decimal = dec!(0.025);

/// Default upper bound for a buy, in settlement currency
pub const MAX_BUY_AMOUNT: Decimal = dec!(0.1);

/// Default share of the amount used for ranked picks
pub const DEFAULT_RANKED_FRACTION: Decimal = dec!(0.5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "buy"),
        }
    }
}

/// How the pre-clamp amount is derived
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum SizingRule {
    /// Always start from the same amount
    Fixed(Decimal),
    /// Start from the token's USD price
    PriceDerived,
}

/// Calling context of a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPreset {
    /// Single admitted token, full amount
    Direct,
    /// High-confidence pick from a ranked batch, reduced amount
    Ranked,
}

impl fmt::Display for DispatchPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchPreset::Direct => write!(f, "direct"),
            DispatchPreset::Ranked => write!(f, "ranked"),
        }
    }
}

/// A buy the agent wants executed; execution itself is external
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIntent {
    pub token_id: String,
    pub symbol: String,
    pub side: TradeSide,
    pub amount: Decimal,
    pub preset: DispatchPreset,
}

impl fmt::Display for TradeIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ({}, {})",
            self.side, self.amount, self.symbol, self.token_id, self.preset
        )
    }
}

/// Computes bounded trade amounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSizer {
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub rule: SizingRule,
    pub ranked_fraction: Decimal,
}

impl Default for TradeSizer {
    fn default() -> Self {
        Self {
            min_amount: MIN_BUY_AMOUNT,
            max_amount: MAX_BUY_AMOUNT,
            rule: SizingRule::Fixed(MAX_BUY_AMOUNT),
            ranked_fraction: DEFAULT_RANKED_FRACTION,
        }
    }
}

impl TradeSizer {
    /// Amount for a token at `price` in the given calling context
    ///
    /// The preset fraction is applied before clamping, so the result always
    /// lies within `[min_amount, max_amount]`.
    pub fn amount(&self, price: f64, preset: DispatchPreset) -> Decimal {
        let base = match self.rule {
            SizingRule::Fixed(amount) => amount,
            SizingRule::PriceDerived => Decimal::from_f64(price).unwrap_or(self.min_amount),
        };

        let fraction = match preset {
            DispatchPreset::Direct => Decimal::ONE,
            DispatchPreset::Ranked => self.ranked_fraction,
        };

        (base * fraction).max(self.min_amount).min(self.max_amount)
    }
}
