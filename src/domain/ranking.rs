//! Ranking Engine
//!
//! Orders admitted tokens by score (descending, ties by identifier
//! ascending) and flags those at or above the action threshold.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::token::TokenCandidate;
use super::verdict::Verdict;

/// Default action threshold for high-confidence picks
pub const DEFAULT_ACTION_THRESHOLD: f64 = 0.7;

/// One admitted token in ranked order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub candidate: TokenCandidate,
    pub verdict: Verdict,
    pub high_confidence: bool,
}

/// Result of ranking one cycle's verdicts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedBatch {
    /// Admitted tokens, best first
    pub entries: Vec<RankedEntry>,
    /// Rejected and inconclusive tokens, kept for audit
    pub excluded: Vec<(TokenCandidate, Verdict)>,
}

impl RankedBatch {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.excluded.is_empty()
    }

    pub fn high_confidence(&self) -> impl Iterator<Item = &RankedEntry> {
        self.entries.iter().filter(|e| e.high_confidence)
    }

    pub fn inconclusive_count(&self) -> usize {
        self.excluded.iter().filter(|(_, v)| v.is_inconclusive()).count()
    }

    pub fn rejected_count(&self) -> usize {
        self.excluded.iter().filter(|(_, v)| v.reason().is_some()).count()
    }
}

#[derive(Debug, Clone)]
pub struct RankingEngine {
    action_threshold: f64,
}

impl Default for RankingEngine {
    fn default() -> Self {
        Self::new(DEFAULT_ACTION_THRESHOLD)
    }
}

impl RankingEngine {
    pub fn new(action_threshold: f64) -> Self {
        Self { action_threshold }
    }

    pub fn action_threshold(&self) -> f64 {
        self.action_threshold
    }

    pub fn is_high_confidence(&self, score: f64) -> bool {
        score >= self.action_threshold
    }

    /// Rank a batch of evaluated tokens
    pub fn rank(&self, batch: Vec<(TokenCandidate, Verdict)>) -> RankedBatch {
        let (admitted, excluded): (Vec<_>, Vec<_>) =
            batch.into_iter().partition(|(_, verdict)| verdict.is_admit());

        let mut entries: Vec<RankedEntry> = admitted
            .into_iter()
            .map(|(candidate, verdict)| RankedEntry {
                high_confidence: self.is_high_confidence(verdict.score),
                candidate,
                verdict,
            })
            .collect();

        entries.sort_by(compare_entries);

        RankedBatch { entries, excluded }
    }
}

fn compare_entries(a: &RankedEntry, b: &RankedEntry) -> Ordering {
    b.verdict
        .score
        .total_cmp(&a.verdict.score)
        .then_with(|| a.candidate.id.cmp(&b.candidate.id))
}
