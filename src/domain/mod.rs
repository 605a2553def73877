//! Domain Layer - Core decision logic for the token vetter
//!
//! This module contains pure domain types and logic with no external dependencies.
//! All external interactions happen through the ports layer.
//!
//! - `token`: candidates, safety reports, enrichment metrics, price trend
//! - `verdict`: admit / reject / inconclusive outcomes
//! - `filter_chain`: ordered short-circuit predicates
//! - `scoring`: pluggable scoring strategies
//! - `ranking`: score ordering and high-confidence flagging
//! - `trade`: trade intents and bounded sizing

pub mod token;
pub mod verdict;
pub mod filter_chain;
pub mod scoring;
pub mod ranking;
pub mod trade;

pub use token::{price_trend, EnrichedMetrics, SafetyReport, SafetyStatus, TokenCandidate, MANUAL_CATEGORY};
pub use verdict::{Outcome, RejectReason, Verdict};
pub use filter_chain::{FilterChain, FilterConfig, FilterResult, TokenRecord};
pub use scoring::{FeatureVector, LogisticModel, ModelScoring, ProbabilityModel, RiskScoreStrategy, ScoringStrategy};
pub use ranking::{RankedBatch, RankedEntry, RankingEngine, DEFAULT_ACTION_THRESHOLD};
pub use trade::{DispatchPreset, SizingRule, TradeIntent, TradeSide, TradeSizer};
