//! Vetting Pipeline
//!
//! Coordinates one polling cycle end to end:
//! listings -> evaluation (bounded parallelism) -> audit -> ranking -> dispatch.
//!
//! Key features:
//! - Per-token failure isolation: every candidate yields a verdict
//! - Cancellation honored at cycle start and before each new evaluation;
//!   in-flight evaluations finish
//! - Manual one-shot evaluation (`evaluate_one`) outside the polling loop

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::dispatcher::ActionDispatcher;
use super::evaluator::TokenEvaluator;
use super::executor::ResilientExecutor;
use crate::domain::{DispatchPreset, RankedBatch, RankingEngine, TokenCandidate, Verdict};
use crate::ports::{AuditSink, ListingSource};

/// Number of ranked tokens written to the log each cycle
const TOP_LOG_COUNT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub categories: Vec<String>,
    pub poll_interval: Duration,
    /// Maximum evaluations in flight at once
    pub concurrency: usize,
    /// Maximum ranked dispatches per cycle
    pub max_actions_per_cycle: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            categories: ["rugged", "pumped", "tier1", "cex_listed"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            poll_interval: Duration::from_secs(300),
            concurrency: 4,
            max_actions_per_cycle: 5,
        }
    }
}

pub struct Pipeline {
    listings: Arc<dyn ListingSource>,
    executor: Arc<ResilientExecutor>,
    evaluator: Arc<TokenEvaluator>,
    ranking: RankingEngine,
    dispatcher: ActionDispatcher,
    audit: Option<Arc<dyn AuditSink>>,
    config: PipelineConfig,
    shutdown: CancellationToken,
}

impl Pipeline {
    pub fn new(
        listings: Arc<dyn ListingSource>,
        executor: Arc<ResilientExecutor>,
        evaluator: Arc<TokenEvaluator>,
        ranking: RankingEngine,
        dispatcher: ActionDispatcher,
        config: PipelineConfig,
    ) -> Self {
        Self {
            listings,
            executor,
            evaluator,
            ranking,
            dispatcher,
            audit: None,
            config,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Use an externally owned cancellation token
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Token that stops the polling loop when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Request graceful shutdown
    pub fn shutdown(&self) {
        tracing::info!("Shutdown requested");
        self.shutdown.cancel();
    }

    /// Poll on the configured interval until shutdown
    pub async fn run(&self) {
        tracing::info!(
            "Starting vetting pipeline - categories: {:?}, poll interval: {:?}, concurrency: {}",
            self.config.categories,
            self.config.poll_interval,
            self.config.concurrency
        );

        while !self.shutdown.is_cancelled() {
            self.run_cycle(&self.config.categories).await;

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        tracing::info!("Vetting pipeline stopped");
    }

    /// Run one full cycle over the given feed categories
    pub async fn run_cycle(&self, categories: &[String]) -> RankedBatch {
        if self.shutdown.is_cancelled() {
            tracing::debug!("Cycle skipped, shutdown in progress");
            return RankedBatch::default();
        }

        let candidates = self.collect_candidates(categories).await;
        let total = candidates.len();

        let evaluated: Vec<(TokenCandidate, Verdict)> = stream::iter(candidates)
            .take_until(self.shutdown.cancelled())
            .map(|candidate| async move {
                let evaluation = self.evaluator.evaluate_detailed(&candidate).await;
                self.persist(&evaluation.candidate, &evaluation.verdict).await;
                (evaluation.candidate, evaluation.verdict)
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        if evaluated.len() < total {
            tracing::warn!(
                "Cycle interrupted: evaluated {} of {} candidates",
                evaluated.len(),
                total
            );
        }

        let batch = self.ranking.rank(evaluated);
        self.log_top(&batch);

        let mut dispatched = 0;
        let actionable = if self.shutdown.is_cancelled() {
            tracing::warn!("Shutdown requested, skipping dispatch for this cycle");
            0
        } else {
            self.config.max_actions_per_cycle
        };
        for entry in batch.high_confidence().take(actionable) {
            match self
                .dispatcher
                .dispatch(&entry.candidate, &entry.verdict, DispatchPreset::Ranked)
                .await
            {
                Ok(_) => dispatched += 1,
                Err(e) => tracing::error!("Dispatch error for {}: {}", entry.candidate.id, e),
            }
        }

        tracing::info!(
            "Cycle complete: {} candidates, {} admitted, {} rejected, {} inconclusive, {} dispatched",
            total,
            batch.entries.len(),
            batch.rejected_count(),
            batch.inconclusive_count(),
            dispatched
        );

        batch
    }

    /// Evaluate one operator-submitted contract address
    ///
    /// An admitted token is dispatched with the full (direct) amount.
    pub async fn evaluate_one(&self, token_id: &str) -> Verdict {
        let token_id = token_id.trim();
        let evaluation = self
            .evaluator
            .evaluate_detailed(&TokenCandidate::manual(token_id))
            .await;
        self.persist(&evaluation.candidate, &evaluation.verdict).await;

        if evaluation.verdict.is_admit() {
            if let Err(e) = self
                .dispatcher
                .dispatch(&evaluation.candidate, &evaluation.verdict, DispatchPreset::Direct)
                .await
            {
                tracing::error!("Dispatch error for {}: {}", token_id, e);
            }
        }

        evaluation.verdict
    }

    /// Fetch all categories, de-duplicating by identifier (first wins)
    async fn collect_candidates(&self, categories: &[String]) -> Vec<TokenCandidate> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for category in categories {
            if self.shutdown.is_cancelled() {
                break;
            }

            let operation = format!("listings:{}", category);
            match self
                .executor
                .execute(&operation, || self.listings.fetch_listings(category))
                .await
            {
                Ok(listings) => {
                    tracing::debug!("{} listings in category {}", listings.len(), category);
                    for candidate in listings {
                        if candidate.id.is_empty() {
                            continue;
                        }
                        if seen.insert(candidate.id.clone()) {
                            candidates.push(candidate);
                        }
                    }
                }
                Err(e) => tracing::warn!("Skipping category {}: {}", category, e),
            }
        }

        candidates
    }

    async fn persist(&self, candidate: &TokenCandidate, verdict: &Verdict) {
        if let Some(audit) = &self.audit {
            if let Err(e) = audit.persist(candidate, verdict).await {
                tracing::warn!("Audit write failed for {}: {}", candidate.id, e);
            }
        }
    }

    fn log_top(&self, batch: &RankedBatch) {
        if batch.entries.is_empty() {
            return;
        }
        tracing::info!("Top {} tokens by score:", TOP_LOG_COUNT.min(batch.entries.len()));
        for entry in batch.entries.iter().take(TOP_LOG_COUNT) {
            tracing::info!(
                "{} ({}): {:.2}%{}",
                entry.candidate.display_name(),
                entry.candidate.id,
                entry.verdict.score * 100.0,
                if entry.high_confidence { " [high confidence]" } else { "" }
            );
        }
    }
}
