//! Token Evaluator
//!
//! Fans out to the safety and metrics services for one token, joins the
//! results into a [`TokenRecord`] and turns it into a [`Verdict`].
//!
//! Flow:
//! 1. Blacklisted candidates are rejected before any lookup
//! 2. Safety report (required): transport failure is inconclusive (or a
//!    rejection, per policy); a non-GOOD status is a rejection
//! 3. Metrics (best-effort): failures default to empty metrics
//! 4. Filter chain, first failing predicate wins
//! 5. Admitted tokens are scored by the configured strategy
//!
//! No trades or notifications happen here; see `dispatcher`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::executor::ResilientExecutor;
use crate::domain::{
    EnrichedMetrics, FilterChain, FilterResult, RejectReason, SafetyReport, ScoringStrategy,
    TokenCandidate, TokenRecord, Verdict,
};
use crate::ports::{MetricsSource, SafetyReportSource};

/// What to do when the safety service cannot be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyFailurePolicy {
    /// Keep "unknown" distinct from "unsafe" so the token can be retried later
    #[default]
    Inconclusive,
    /// Treat an unreachable safety service as a failed check
    Reject,
}

/// Verdict plus the joined record it was decided on (absent when the
/// evaluation stopped before the record could be built)
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub candidate: TokenCandidate,
    pub verdict: Verdict,
    pub record: Option<TokenRecord>,
}

pub struct TokenEvaluator {
    safety: Arc<dyn SafetyReportSource>,
    metrics: Arc<dyn MetricsSource>,
    executor: Arc<ResilientExecutor>,
    chain: FilterChain,
    scoring: Arc<dyn ScoringStrategy>,
    failure_policy: SafetyFailurePolicy,
}

impl TokenEvaluator {
    pub fn new(
        safety: Arc<dyn SafetyReportSource>,
        metrics: Arc<dyn MetricsSource>,
        executor: Arc<ResilientExecutor>,
        chain: FilterChain,
        scoring: Arc<dyn ScoringStrategy>,
    ) -> Self {
        tracing::info!("Token evaluator using {} scoring", scoring.name());
        Self {
            safety,
            metrics,
            executor,
            chain,
            scoring,
            failure_policy: SafetyFailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: SafetyFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }

    pub fn scoring_name(&self) -> &str {
        self.scoring.name()
    }

    /// Evaluate a candidate and return only the verdict
    pub async fn evaluate(&self, candidate: &TokenCandidate) -> Verdict {
        self.evaluate_detailed(candidate).await.verdict
    }

    /// Evaluate a candidate, keeping the enriched candidate and joined record
    pub async fn evaluate_detailed(&self, candidate: &TokenCandidate) -> Evaluation {
        let id = candidate.id.as_str();

        if self.chain.is_blacklisted(candidate) {
            let verdict = Verdict::reject(id, RejectReason::Blacklist, 0.0);
            log_verdict(candidate, &verdict);
            return Evaluation {
                candidate: candidate.clone(),
                verdict,
                record: None,
            };
        }

        let safety = match self
            .executor
            .execute("safety_report", || self.safety.fetch_safety_report(id))
            .await
        {
            Ok(report) => report,
            Err(failure) => {
                let verdict = if failure.is_transport() && self.failure_policy == SafetyFailurePolicy::Inconclusive {
                    Verdict::inconclusive(id, failure.to_string())
                } else {
                    Verdict::reject(id, RejectReason::SafetyCheckFailed, 0.0).with_detail(failure.to_string())
                };
                log_verdict(candidate, &verdict);
                return Evaluation {
                    candidate: candidate.clone(),
                    verdict,
                    record: None,
                };
            }
        };

        if !safety.status.is_good() {
            let verdict = Verdict::reject(id, RejectReason::SafetyStatus, safety.risk_score)
                .with_detail(format!("status {}", safety.status));
            log_verdict(candidate, &verdict);
            return Evaluation {
                candidate: enrich_candidate(candidate, &safety, None),
                verdict,
                record: None,
            };
        }

        let metrics = match self
            .executor
            .execute("metrics", || self.metrics.fetch_metrics(id))
            .await
        {
            Ok(metrics) => metrics,
            Err(failure) => {
                tracing::warn!("Metrics unavailable for {}, using defaults: {}", id, failure);
                EnrichedMetrics::empty(id)
            }
        };

        let candidate = enrich_candidate(candidate, &safety, Some(&metrics));
        let record = TokenRecord::new(candidate.clone(), safety, metrics);
        let verdict = self.decide(&record);
        log_verdict(&candidate, &verdict);

        Evaluation {
            candidate,
            verdict,
            record: Some(record),
        }
    }

    /// Pure decision over an already-joined record
    pub fn decide(&self, record: &TokenRecord) -> Verdict {
        match self.chain.apply(record) {
            FilterResult::Fail(reason) => Verdict::reject(record.id(), reason, record.safety.risk_score),
            FilterResult::Pass => Verdict::admit(record.id(), self.scoring.score(record)),
        }
    }
}

/// Fill gaps in a bare candidate from the lookups
fn enrich_candidate(
    candidate: &TokenCandidate,
    safety: &SafetyReport,
    metrics: Option<&EnrichedMetrics>,
) -> TokenCandidate {
    let mut enriched = candidate.clone();
    if enriched.name.is_empty() {
        if let Some(name) = &safety.name {
            enriched.name = name.clone();
        }
    }
    if enriched.price == 0.0 {
        if let Some(last) = metrics.and_then(|m| m.price_history.last()) {
            if last.is_finite() && *last > 0.0 {
                enriched.price = *last;
            }
        }
    }
    enriched
}

fn log_verdict(candidate: &TokenCandidate, verdict: &Verdict) {
    match verdict.reason() {
        Some(reason) => tracing::info!(
            token = %verdict.token_id,
            reason = %reason,
            "Rejected {}: {}{}",
            candidate.display_name(),
            reason,
            verdict.detail.as_deref().map(|d| format!(" ({})", d)).unwrap_or_default()
        ),
        None if verdict.is_admit() => tracing::info!(
            token = %verdict.token_id,
            score = verdict.score,
            "Admitted {} with score {:.4}",
            candidate.display_name(),
            verdict.score
        ),
        None => tracing::warn!(
            token = %verdict.token_id,
            "Inconclusive {}: {}",
            candidate.display_name(),
            verdict.detail.as_deref().unwrap_or("no detail")
        ),
    }
}
