//! In-memory adapters backed by a fixture file
//!
//! Used by the `replay` command to run a cycle offline and by the
//! integration tests. A fixture is a JSON document:
//!
//! ```json
//! {
//!   "listings": { "pumped": [ { "id": "Mint1", "symbol": "ONE", "volume_24h": 5000 } ] },
//!   "safety":   [ { "token_id": "Mint1", "status": "GOOD", "risk_score": 0.85 } ],
//!   "metrics":  [ { "token_id": "Mint1", "top_holders": 120, "price_history": [1.0, 1.2] } ],
//!   "unreachable": [ "Mint9" ]
//! }
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{EnrichedMetrics, SafetyReport, TokenCandidate, Verdict};
use crate::ports::{AuditSink, ListingSource, MetricsSource, Notifier, SafetyReportSource, SourceError};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse fixture file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Recorded provider responses for one or more categories
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureSet {
    pub listings: BTreeMap<String, Vec<TokenCandidate>>,
    pub safety: Vec<SafetyReport>,
    pub metrics: Vec<EnrichedMetrics>,
    /// Tokens whose safety lookup fails at the transport level
    pub unreachable: Vec<String>,
}

impl FixtureSet {
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, FixtureError> {
        let mut fixtures: FixtureSet = serde_json::from_str(content)?;
        // Listings inside a category block inherit the block's name
        for (category, listings) in fixtures.listings.iter_mut() {
            for candidate in listings.iter_mut().filter(|c| c.category.is_empty()) {
                candidate.category = category.clone();
            }
        }
        Ok(fixtures)
    }

    /// Categories in a stable order
    pub fn categories(&self) -> Vec<String> {
        self.listings.keys().cloned().collect()
    }

    pub fn listing_source(&self) -> StaticListingSource {
        StaticListingSource::new(self.listings.clone())
    }

    pub fn safety_source(&self) -> StaticSafetySource {
        StaticSafetySource::new(self.safety.clone(), self.unreachable.iter().cloned())
    }

    pub fn metrics_source(&self) -> StaticMetricsSource {
        StaticMetricsSource::new(self.metrics.clone())
    }
}

/// Fixed listings per category; unknown categories are empty
#[derive(Debug, Default)]
pub struct StaticListingSource {
    listings: BTreeMap<String, Vec<TokenCandidate>>,
    failing: HashSet<String>,
}

impl StaticListingSource {
    pub fn new(listings: BTreeMap<String, Vec<TokenCandidate>>) -> Self {
        Self {
            listings,
            failing: HashSet::new(),
        }
    }

    /// Make a category fail with a transport error
    pub fn with_failing_category(mut self, category: impl Into<String>) -> Self {
        self.failing.insert(category.into());
        self
    }
}

#[async_trait]
impl ListingSource for StaticListingSource {
    async fn fetch_listings(&self, category: &str) -> Result<Vec<TokenCandidate>, SourceError> {
        if self.failing.contains(category) {
            return Err(SourceError::Transport(format!("listing feed down for {}", category)));
        }
        Ok(self.listings.get(category).cloned().unwrap_or_default())
    }
}

/// Fixed safety reports keyed by token id
#[derive(Debug, Default)]
pub struct StaticSafetySource {
    reports: HashMap<String, SafetyReport>,
    unreachable: HashSet<String>,
    calls: AtomicUsize,
}

impl StaticSafetySource {
    pub fn new(reports: Vec<SafetyReport>, unreachable: impl IntoIterator<Item = String>) -> Self {
        Self {
            reports: reports.into_iter().map(|r| (r.token_id.clone(), r)).collect(),
            unreachable: unreachable.into_iter().collect(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of lookups served, including failed ones
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SafetyReportSource for StaticSafetySource {
    async fn fetch_safety_report(&self, token_id: &str) -> Result<SafetyReport, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.contains(token_id) {
            return Err(SourceError::Transport("connection refused".into()));
        }
        self.reports
            .get(token_id)
            .cloned()
            .ok_or_else(|| SourceError::Data(format!("no safety report for {}", token_id)))
    }
}

/// Fixed metrics keyed by token id
#[derive(Debug, Default)]
pub struct StaticMetricsSource {
    metrics: HashMap<String, EnrichedMetrics>,
}

impl StaticMetricsSource {
    pub fn new(metrics: Vec<EnrichedMetrics>) -> Self {
        Self {
            metrics: metrics.into_iter().map(|m| (m.token_id.clone(), m)).collect(),
        }
    }
}

#[async_trait]
impl MetricsSource for StaticMetricsSource {
    async fn fetch_metrics(&self, token_id: &str) -> Result<EnrichedMetrics, SourceError> {
        self.metrics
            .get(token_id)
            .cloned()
            .ok_or_else(|| SourceError::Data(format!("no metrics for {}", token_id)))
    }
}

/// Keeps every message it is asked to send
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<(), SourceError> {
        self.messages
            .lock()
            .map_err(|_| SourceError::Data("notifier poisoned".into()))?
            .push(message.to_string());
        Ok(())
    }
}

/// Keeps every audited verdict
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<(TokenCandidate, Verdict)>>,
}

impl MemoryAuditSink {
    pub fn records(&self) -> Vec<(TokenCandidate, Verdict)> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn persist(&self, candidate: &TokenCandidate, verdict: &Verdict) -> Result<(), SourceError> {
        self.records
            .lock()
            .map_err(|_| SourceError::Data("audit sink poisoned".into()))?
            .push((candidate.clone(), verdict.clone()));
        Ok(())
    }
}
