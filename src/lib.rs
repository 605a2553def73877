//! Token Vetter - Listing feed screening agent
//!
//! Polls token listing feeds, vets each candidate against a third-party
//! safety service and a chain of filters, ranks the survivors by score and
//! records trade intents for the high-confidence picks.
//!
//! # Modules
//!
//! - `domain`: Core decision logic (TokenCandidate, Verdict, FilterChain, RankingEngine, TradeSizer)
//! - `ports`: Trait abstractions (ListingSource, SafetyReportSource, MetricsSource, TradeRecorder, Notifier, AuditSink)
//! - `adapters`: External implementations (GMGN, Dexscreener, RugCheck, Telegram, trade relay, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Executor, evaluator, dispatcher and the polling pipeline

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
