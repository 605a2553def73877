//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - GMGN: category listing feed and token metrics
//! - Dexscreener: pair search listing feed
//! - RugCheck: safety report summaries
//! - Telegram: operator notifications
//! - Trade relay: HTTP and paper trade recorders
//! - Audit: JSON-lines verdict log
//! - Memory: fixture-backed adapters for replay and tests
//! - CLI: Command-line interface definitions

pub mod http;
pub mod gmgn;
pub mod dexscreener;
pub mod rugcheck;
pub mod telegram;
pub mod trade_relay;
pub mod audit;
pub mod memory;
pub mod cli;

pub use gmgn::{GmgnClient, GmgnConfig};
pub use dexscreener::{DexscreenerClient, DexscreenerConfig};
pub use rugcheck::{RugcheckClient, RugcheckConfig};
pub use telegram::{LogNotifier, TelegramConfig, TelegramNotifier};
pub use trade_relay::{PaperTrade, PaperTradeRecorder, TradeRelayClient, TradeRelayConfig};
pub use audit::{AuditRecord, JsonlAuditSink};
pub use memory::{
    FixtureError, FixtureSet, MemoryAuditSink, RecordingNotifier, StaticListingSource, StaticMetricsSource,
    StaticSafetySource,
};
pub use cli::CliApp;
