//! Evaluation Verdicts
//!
//! One verdict per token per cycle. A rejection always carries a reason from
//! [`RejectReason`]; admissions and inconclusive results never do.

use serde::{Deserialize, Serialize};

/// Why a token was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    /// Identifier, symbol or developer wallet is blacklisted
    Blacklist,
    /// 24h volume below the configured minimum
    MinVolume,
    /// Safety report status is not GOOD
    SafetyStatus,
    /// Liquidity-to-supply ratio too low, or unknown
    SupplyConcentration,
    /// Safety service unreachable and the policy treats that as unsafe
    SafetyCheckFailed,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Blacklist => "BLACKLIST",
            RejectReason::MinVolume => "MIN_VOLUME",
            RejectReason::SafetyStatus => "SAFETY_STATUS",
            RejectReason::SupplyConcentration => "SUPPLY_CONCENTRATION",
            RejectReason::SafetyCheckFailed => "SAFETY_CHECK_FAILED",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluation outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Admit,
    Reject(RejectReason),
    /// Data needed for a decision could not be fetched; retry later
    Inconclusive,
}

/// Decision for a single token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub token_id: String,
    pub outcome: Outcome,
    /// Strategy score for admissions, provider risk score otherwise (0 when unknown)
    pub score: f64,
    /// Free-form detail, e.g. the transport error behind an inconclusive result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Verdict {
    pub fn admit(token_id: impl Into<String>, score: f64) -> Self {
        Self {
            token_id: token_id.into(),
            outcome: Outcome::Admit,
            score: sanitize(score),
            detail: None,
        }
    }

    pub fn reject(token_id: impl Into<String>, reason: RejectReason, score: f64) -> Self {
        Self {
            token_id: token_id.into(),
            outcome: Outcome::Reject(reason),
            score: sanitize(score),
            detail: None,
        }
    }

    pub fn inconclusive(token_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            token_id: token_id.into(),
            outcome: Outcome::Inconclusive,
            score: 0.0,
            detail: Some(detail.into()),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_admit(&self) -> bool {
        matches!(self.outcome, Outcome::Admit)
    }

    pub fn is_inconclusive(&self) -> bool {
        matches!(self.outcome, Outcome::Inconclusive)
    }

    /// Rejection reason, set iff the outcome is a rejection
    pub fn reason(&self) -> Option<RejectReason> {
        match self.outcome {
            Outcome::Reject(reason) => Some(reason),
            _ => None,
        }
    }
}

fn sanitize(score: f64) -> f64 {
    if score.is_finite() {
        score
    } else {
        0.0
    }
}
