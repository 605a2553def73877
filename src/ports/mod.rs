//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Listing feeds, safety reports and token metrics
//! - Trade-intent recording and operator notifications
//! - The audit sink

pub mod market_data;
pub mod execution;
pub mod models;

pub use market_data::{ListingSource, MetricsSource, SafetyReportSource};
pub use execution::{AuditSink, Notifier, TradeRecorder};
pub use models::SourceError;

#[cfg(test)]
pub use market_data::{MockListingSource, MockMetricsSource, MockSafetyReportSource};
#[cfg(test)]
pub use execution::{MockAuditSink, MockNotifier, MockTradeRecorder};
