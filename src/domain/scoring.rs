//! Scoring Strategies
//!
//! Admitted tokens are scored by a pluggable [`ScoringStrategy`]:
//! - `RiskScoreStrategy`: the safety provider's risk score, unchanged
//! - `ModelScoring`: success probability from an opaque trained classifier
//!
//! The classifier is consumed through [`ProbabilityModel`]; training happens
//! elsewhere. [`LogisticModel`] evaluates exported logistic-regression
//! weights.

use serde::{Deserialize, Serialize};

use super::filter_chain::TokenRecord;

/// Scores an admitted token; higher is better
pub trait ScoringStrategy: Send + Sync {
    /// Strategy name for logs
    fn name(&self) -> &str;

    fn score(&self, record: &TokenRecord) -> f64;
}

/// Uses the safety report's risk score as the ranking score
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskScoreStrategy;

impl ScoringStrategy for RiskScoreStrategy {
    fn name(&self) -> &str {
        "risk_score"
    }

    fn score(&self, record: &TokenRecord) -> f64 {
        record.safety.risk_score
    }
}

/// Model inputs, in the order the classifier was trained on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub top_holders: f64,
    /// ln(1 + volume) to keep the scale comparable to the other features
    pub log_volume: f64,
    pub price_trend: f64,
    pub risk_score: f64,
}

impl FeatureVector {
    pub fn from_record(record: &TokenRecord) -> Self {
        Self {
            top_holders: record.metrics.top_holders as f64,
            log_volume: record.volume_24h().max(0.0).ln_1p(),
            price_trend: record.price_trend,
            risk_score: record.safety.risk_score,
        }
    }
}

/// Opaque success-probability model
pub trait ProbabilityModel: Send + Sync {
    /// Probability in [0, 1]
    fn predict_proba(&self, features: &FeatureVector) -> f64;
}

/// Logistic regression over [`FeatureVector`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticModel {
    pub bias: f64,
    pub top_holders: f64,
    pub log_volume: f64,
    pub price_trend: f64,
    pub risk_score: f64,
}

impl Default for LogisticModel {
    fn default() -> Self {
        Self {
            bias: -2.0,
            top_holders: 0.002,
            log_volume: 0.15,
            price_trend: 0.01,
            risk_score: 1.5,
        }
    }
}

impl ProbabilityModel for LogisticModel {
    fn predict_proba(&self, features: &FeatureVector) -> f64 {
        let z = self.bias
            + self.top_holders * features.top_holders
            + self.log_volume * features.log_volume
            + self.price_trend * features.price_trend
            + self.risk_score * features.risk_score;
        sigmoid(z)
    }
}

/// Scores with a [`ProbabilityModel`]
pub struct ModelScoring<M: ProbabilityModel> {
    model: M,
}

impl<M: ProbabilityModel> ModelScoring<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

impl<M: ProbabilityModel> ScoringStrategy for ModelScoring<M> {
    fn name(&self) -> &str {
        "model"
    }

    fn score(&self, record: &TokenRecord) -> f64 {
        let p = self.model.predict_proba(&FeatureVector::from_record(record));
        if p.is_finite() {
            p.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::token::{EnrichedMetrics, SafetyReport, SafetyStatus, TokenCandidate};
    use approx::assert_relative_eq;

    fn record(risk_score: f64) -> TokenRecord {
        let candidate = TokenCandidate::new("Mint1", "ONE", "tier1").with_volume(1_000.0);
        let safety = SafetyReport::new("Mint1", SafetyStatus::Good, risk_score);
        let metrics = EnrichedMetrics {
            token_id: "Mint1".to_string(),
            top_holders: 250,
            trading_volume: 0.0,
            price_history: vec![1.0, 1.0, 1.0, 1.0, 2.0],
            liquidity: None,
            total_supply: None,
        };
        TokenRecord::new(candidate, safety, metrics)
    }

    #[test]
    fn test_risk_score_strategy_passes_through() {
        assert_eq!(RiskScoreStrategy.score(&record(0.85)), 0.85);
    }

    #[test]
    fn test_feature_vector() {
        let features = FeatureVector::from_record(&record(0.5));
        assert_eq!(features.top_holders, 250.0);
        assert_relative_eq!(features.log_volume, 1_001.0f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(features.price_trend, 100.0, epsilon = 1e-12);
        assert_eq!(features.risk_score, 0.5);
    }

    #[test]
    fn test_logistic_model_zero_weights_is_half() {
        let model = LogisticModel {
            bias: 0.0,
            top_holders: 0.0,
            log_volume: 0.0,
            price_trend: 0.0,
            risk_score: 0.0,
        };
        let scoring = ModelScoring::new(model);
        assert_relative_eq!(scoring.score(&record(0.9)), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_model_score_is_monotonic_in_risk_weight() {
        let scoring = ModelScoring::new(LogisticModel::default());
        let low = scoring.score(&record(0.1));
        let high = scoring.score(&record(0.9));
        assert!(high > low);
        assert!((0.0..=1.0).contains(&low));
        assert!((0.0..=1.0).contains(&high));
    }

    struct BrokenModel;

    impl ProbabilityModel for BrokenModel {
        fn predict_proba(&self, _features: &FeatureVector) -> f64 {
            f64::NAN
        }
    }

    #[test]
    fn test_non_finite_probability_scores_zero() {
        assert_eq!(ModelScoring::new(BrokenModel).score(&record(0.9)), 0.0);
    }
}
