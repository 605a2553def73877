//! Side-effect ports: trade recording, notifications and audit

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::models::SourceError;
use crate::domain::{TokenCandidate, TradeSide, Verdict};

/// Records a trade intent; actual execution happens outside the agent
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TradeRecorder: Send + Sync {
    async fn record_trade(&self, token_id: &str, amount: Decimal, side: TradeSide) -> Result<(), SourceError>;
}

/// Operator notification channel
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<(), SourceError>;
}

/// Optional sink for every evaluated token
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn persist(&self, candidate: &TokenCandidate, verdict: &Verdict) -> Result<(), SourceError>;
}
