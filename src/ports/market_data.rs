//! Market data ports: listing feeds, safety reports and metrics

use async_trait::async_trait;

use super::models::SourceError;
use crate::domain::{EnrichedMetrics, SafetyReport, TokenCandidate};

/// Listing feed that discovers candidate tokens
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch current listings for a feed category (e.g. "pumped", "tier1")
    async fn fetch_listings(&self, category: &str) -> Result<Vec<TokenCandidate>, SourceError>;
}

/// Rug/scam assessment service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SafetyReportSource: Send + Sync {
    async fn fetch_safety_report(&self, token_id: &str) -> Result<SafetyReport, SourceError>;
}

/// Holder, volume and price-history service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn fetch_metrics(&self, token_id: &str) -> Result<EnrichedMetrics, SourceError>;
}
