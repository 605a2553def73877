//! Filter Chain
//!
//! Ordered safety/quality predicates applied to a combined token record.
//! The first failing predicate decides the rejection reason; later
//! predicates are not evaluated.
//!
//! Order:
//! 1. `Blacklist` - identifier, symbol or developer wallet blacklisted
//! 2. `MinVolume` - 24h volume below minimum
//! 3. `SafetyStatus` - safety report not GOOD
//! 4. `SupplyConcentration` - liquidity/supply ratio not above threshold
//!    (fails closed when supply is zero or liquidity is unknown)

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::token::{EnrichedMetrics, SafetyReport, TokenCandidate};
use super::verdict::RejectReason;

/// Default minimum 24h volume in USD
pub const DEFAULT_MIN_VOLUME: f64 = 1_000.0;

/// Default liquidity-to-supply ratio that must be exceeded
pub const DEFAULT_MIN_LIQUIDITY_SUPPLY_RATIO: f64 = 10.0;

/// Candidate, safety report and metrics joined on the token identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub candidate: TokenCandidate,
    pub safety: SafetyReport,
    pub metrics: EnrichedMetrics,
    /// Percentage trend over the metrics price history
    pub price_trend: f64,
}

impl TokenRecord {
    pub fn new(candidate: TokenCandidate, safety: SafetyReport, metrics: EnrichedMetrics) -> Self {
        let price_trend = metrics.price_trend();
        Self {
            candidate,
            safety,
            metrics,
            price_trend,
        }
    }

    pub fn id(&self) -> &str {
        &self.candidate.id
    }

    /// Listing volume, or trailing metrics volume when the listing has none
    pub fn volume_24h(&self) -> f64 {
        if self.candidate.volume_24h > 0.0 {
            self.candidate.volume_24h
        } else {
            self.metrics.trading_volume
        }
    }

    /// Listing liquidity, falling back to the metrics service
    pub fn liquidity(&self) -> Option<f64> {
        self.candidate.liquidity.or(self.metrics.liquidity)
    }

    /// Listing supply, falling back to the metrics service
    pub fn total_supply(&self) -> Option<f64> {
        self.candidate.total_supply.or(self.metrics.total_supply)
    }
}

/// Predicate result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    Pass,
    Fail(RejectReason),
}

impl FilterResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, FilterResult::Pass)
    }
}

/// Thresholds and lists driving the chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub min_volume: f64,
    pub min_liquidity_supply_ratio: f64,
    /// Blacklisted contract addresses or symbols
    pub coin_blacklist: HashSet<String>,
    /// Blacklisted developer wallets
    pub dev_blacklist: HashSet<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_volume: DEFAULT_MIN_VOLUME,
            min_liquidity_supply_ratio: DEFAULT_MIN_LIQUIDITY_SUPPLY_RATIO,
            coin_blacklist: HashSet::new(),
            dev_blacklist: HashSet::new(),
        }
    }
}

/// Ordered predicate chain
#[derive(Debug, Clone)]
pub struct FilterChain {
    config: FilterConfig,
}

impl FilterChain {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Run every predicate in order, stopping at the first failure
    pub fn apply(&self, record: &TokenRecord) -> FilterResult {
        let checks: [fn(&Self, &TokenRecord) -> FilterResult; 4] = [
            Self::check_blacklist,
            Self::check_min_volume,
            Self::check_safety_status,
            Self::check_supply_concentration,
        ];

        for check in checks {
            if let FilterResult::Fail(reason) = check(self, record) {
                debug!("{} failed {}", record.id(), reason);
                return FilterResult::Fail(reason);
            }
        }
        FilterResult::Pass
    }

    /// Blacklist check on the candidate alone, usable before any lookup
    pub fn is_blacklisted(&self, candidate: &TokenCandidate) -> bool {
        let coins = &self.config.coin_blacklist;
        if coins.contains(&candidate.id) {
            return true;
        }
        if !candidate.symbol.is_empty() && coins.contains(&candidate.symbol) {
            return true;
        }
        candidate
            .dev_wallet
            .as_ref()
            .is_some_and(|dev| self.config.dev_blacklist.contains(dev))
    }

    pub fn check_blacklist(&self, record: &TokenRecord) -> FilterResult {
        if self.is_blacklisted(&record.candidate) {
            FilterResult::Fail(RejectReason::Blacklist)
        } else {
            FilterResult::Pass
        }
    }

    pub fn check_min_volume(&self, record: &TokenRecord) -> FilterResult {
        if record.volume_24h() < self.config.min_volume {
            FilterResult::Fail(RejectReason::MinVolume)
        } else {
            FilterResult::Pass
        }
    }

    pub fn check_safety_status(&self, record: &TokenRecord) -> FilterResult {
        if record.safety.status.is_good() {
            FilterResult::Pass
        } else {
            FilterResult::Fail(RejectReason::SafetyStatus)
        }
    }

    pub fn check_supply_concentration(&self, record: &TokenRecord) -> FilterResult {
        let (Some(liquidity), Some(supply)) = (record.liquidity(), record.total_supply()) else {
            return FilterResult::Fail(RejectReason::SupplyConcentration);
        };
        if supply <= 0.0 {
            return FilterResult::Fail(RejectReason::SupplyConcentration);
        }

        let ratio = liquidity / supply;
        if ratio.is_finite() && ratio > self.config.min_liquidity_supply_ratio {
            FilterResult::Pass
        } else {
            FilterResult::Fail(RejectReason::SupplyConcentration)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::token::SafetyStatus;

    fn chain() -> FilterChain {
        let mut config = FilterConfig::default();
        config.coin_blacklist.insert("SCAM".to_string());
        config.coin_blacklist.insert("BadMint111".to_string());
        config.dev_blacklist.insert("RugDev111".to_string());
        FilterChain::new(config)
    }

    fn passing_record() -> TokenRecord {
        let candidate = TokenCandidate::new("Mint111", "GOODCOIN", "pumped")
            .with_price(0.5)
            .with_volume(100_000.0)
            .with_liquidity(50_000.0)
            .with_total_supply(1_000.0);
        let safety = SafetyReport::new("Mint111", SafetyStatus::Good, 0.85);
        let metrics = EnrichedMetrics::empty("Mint111");
        TokenRecord::new(candidate, safety, metrics)
    }

    #[test]
    fn test_passing_record() {
        assert_eq!(chain().apply(&passing_record()), FilterResult::Pass);
    }

    #[test]
    fn test_blacklisted_symbol_regardless_of_other_fields() {
        let mut record = passing_record();
        record.candidate.symbol = "SCAM".to_string();
        record.candidate.volume_24h = 100_000.0;
        assert_eq!(chain().apply(&record), FilterResult::Fail(RejectReason::Blacklist));

        record.safety.status = SafetyStatus::Bad;
        record.candidate.total_supply = Some(0.0);
        assert_eq!(chain().apply(&record), FilterResult::Fail(RejectReason::Blacklist));
    }

    #[test]
    fn test_blacklisted_identifier_and_dev() {
        let mut record = passing_record();
        record.candidate.id = "BadMint111".to_string();
        assert_eq!(chain().check_blacklist(&record), FilterResult::Fail(RejectReason::Blacklist));

        let mut record = passing_record();
        record.candidate.dev_wallet = Some("RugDev111".to_string());
        assert_eq!(chain().check_blacklist(&record), FilterResult::Fail(RejectReason::Blacklist));
    }

    #[test]
    fn test_empty_symbol_never_matches() {
        let mut config = FilterConfig::default();
        config.coin_blacklist.insert(String::new());
        let chain = FilterChain::new(config);

        let candidate = TokenCandidate::manual("Mint999");
        assert!(!chain.is_blacklisted(&candidate));
    }

    #[test]
    fn test_min_volume() {
        let mut config = FilterConfig::default();
        config.min_volume = 1_000.0;
        let chain = FilterChain::new(config);

        let mut record = passing_record();
        record.candidate.volume_24h = 10.0;
        assert_eq!(chain.apply(&record), FilterResult::Fail(RejectReason::MinVolume));

        record.candidate.volume_24h = 1_000.0;
        assert!(chain.check_min_volume(&record).is_pass());
    }

    #[test]
    fn test_min_volume_falls_back_to_metrics() {
        let mut record = passing_record();
        record.candidate.volume_24h = 0.0;
        record.metrics.trading_volume = 5_000.0;
        assert!(chain().check_min_volume(&record).is_pass());
    }

    #[test]
    fn test_safety_status() {
        let mut record = passing_record();
        record.safety.status = SafetyStatus::Bad;
        assert_eq!(chain().apply(&record), FilterResult::Fail(RejectReason::SafetyStatus));

        record.safety.status = SafetyStatus::Unknown;
        assert_eq!(chain().apply(&record), FilterResult::Fail(RejectReason::SafetyStatus));
    }

    #[test]
    fn test_supply_concentration_low_ratio() {
        let mut record = passing_record();
        record.candidate.liquidity = Some(50.0);
        record.candidate.total_supply = Some(1_000.0);
        assert_eq!(chain().apply(&record), FilterResult::Fail(RejectReason::SupplyConcentration));
    }

    #[test]
    fn test_supply_concentration_ratio_must_exceed_threshold() {
        let mut record = passing_record();
        record.candidate.liquidity = Some(10_000.0);
        record.candidate.total_supply = Some(1_000.0);
        assert_eq!(
            chain().check_supply_concentration(&record),
            FilterResult::Fail(RejectReason::SupplyConcentration)
        );

        record.candidate.liquidity = Some(10_001.0);
        assert!(chain().check_supply_concentration(&record).is_pass());
    }

    #[test]
    fn test_supply_concentration_fails_closed() {
        for liquidity in [0.0, 1.0, 1e12, f64::MAX] {
            let mut record = passing_record();
            record.candidate.liquidity = Some(liquidity);
            record.candidate.total_supply = Some(0.0);
            assert_eq!(
                chain().check_supply_concentration(&record),
                FilterResult::Fail(RejectReason::SupplyConcentration)
            );
        }

        let mut record = passing_record();
        record.candidate.liquidity = None;
        assert_eq!(
            chain().check_supply_concentration(&record),
            FilterResult::Fail(RejectReason::SupplyConcentration)
        );

        let mut record = passing_record();
        record.candidate.total_supply = None;
        assert_eq!(
            chain().check_supply_concentration(&record),
            FilterResult::Fail(RejectReason::SupplyConcentration)
        );
    }

    #[test]
    fn test_supply_falls_back_to_metrics() {
        let mut record = passing_record();
        record.candidate.liquidity = None;
        record.candidate.total_supply = None;
        record.metrics.liquidity = Some(20_000.0);
        record.metrics.total_supply = Some(100.0);
        assert!(chain().check_supply_concentration(&record).is_pass());
    }

    #[test]
    fn test_chain_is_idempotent() {
        let chain = chain();
        let mut record = passing_record();
        record.safety.status = SafetyStatus::Bad;

        let first = chain.apply(&record);
        let second = chain.apply(&record);
        assert_eq!(first, second);
        assert_eq!(chain.check_safety_status(&record), first);
    }
}
