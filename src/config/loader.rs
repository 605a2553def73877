//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/default.toml.
//! Secrets may be left empty in the file and supplied through the environment.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::application::{PipelineConfig, RetryPolicy, SafetyFailurePolicy};
use crate::domain::{
    FilterConfig, LogisticModel, ModelScoring, RiskScoreStrategy, ScoringStrategy, SizingRule, TradeSizer,
};

/// Main configuration structure matching config/default.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub sources: SourcesSection,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub filters: FiltersSection,
    #[serde(default)]
    pub scoring: ScoringSection,
    #[serde(default)]
    pub ranking: RankingSection,
    #[serde(default)]
    pub dispatch: DispatchSection,
    #[serde(default)]
    pub polling: PollingSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub alerts: AlertsSection,
    #[serde(default)]
    pub audit: AuditSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingProvider {
    #[default]
    Gmgn,
    Dexscreener,
}

/// External data services
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesSection {
    /// Which feed discovers candidates
    #[serde(default)]
    pub listing_provider: ListingProvider,
    /// GMGN API base URL (listings and metrics)
    #[serde(default)]
    pub gmgn_url: String,
    #[serde(default)]
    pub gmgn_api_key: Option<String>,
    /// Dexscreener API base URL
    #[serde(default)]
    pub dexscreener_url: String,
    /// Chain filter for Dexscreener pairs
    #[serde(default = "default_chain_id")]
    pub dexscreener_chain: String,
    /// RugCheck API base URL
    #[serde(default)]
    pub rugcheck_url: String,
    #[serde(default)]
    pub rugcheck_api_key: Option<String>,
    /// HTTP client timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_chain_id() -> String {
    "solana".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl SourcesSection {
    /// GMGN key with GMGN_API_KEY fallback
    pub fn gmgn_api_key(&self) -> Option<String> {
        secret(&self.gmgn_api_key, "GMGN_API_KEY")
    }

    /// RugCheck key with RUGCHECK_API_KEY fallback
    pub fn rugcheck_api_key(&self) -> Option<String> {
        secret(&self.rugcheck_api_key, "RUGCHECK_API_KEY")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Executor retry policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub delay_secs: u64,
    /// Per-attempt timeout
    pub timeout_secs: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_secs: 5,
            timeout_secs: 10,
        }
    }
}

/// Filter chain thresholds and blacklists
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FiltersSection {
    pub min_volume: f64,
    pub min_liquidity_supply_ratio: f64,
    /// Contract addresses or symbols
    pub coin_blacklist: Vec<String>,
    /// Developer wallets
    pub dev_blacklist: Vec<String>,
    pub safety_failure_policy: SafetyFailurePolicy,
}

impl Default for FiltersSection {
    fn default() -> Self {
        Self {
            min_volume: 1000.0,
            min_liquidity_supply_ratio: 10.0,
            coin_blacklist: Vec::new(),
            dev_blacklist: Vec::new(),
            safety_failure_policy: SafetyFailurePolicy::Inconclusive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringKind {
    /// Provider risk score as-is
    #[default]
    RiskScore,
    /// Logistic model probability
    Model,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScoringSection {
    pub strategy: ScoringKind,
    pub model: LogisticModel,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingSection {
    /// Scores at or above this are high-confidence
    pub action_threshold: f64,
    /// Ranked dispatches per cycle
    pub max_actions_per_cycle: usize,
}

impl Default for RankingSection {
    fn default() -> Self {
        Self {
            action_threshold: 0.7,
            max_actions_per_cycle: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMode {
    #[default]
    Fixed,
    /// Pre-clamp amount is the token price
    Price,
}

/// Trade sizing and the trade recorder
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchSection {
    /// Record trades locally instead of relaying them
    pub paper: bool,
    pub relay_url: String,
    pub relay_api_key: Option<String>,
    pub min_buy_amount: f64,
    pub max_buy_amount: f64,
    pub sizing: SizingMode,
    pub fixed_amount: f64,
    /// Share of the amount used for ranked picks
    pub ranked_fraction: f64,
    pub settlement_symbol: String,
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self {
            paper: true,
            relay_url: String::new(),
            relay_api_key: None,
            min_buy_amount: 0.025,
            max_buy_amount: 0.1,
            sizing: SizingMode::Fixed,
            fixed_amount: 0.1,
            ranked_fraction: 0.5,
            settlement_symbol: "SOL".to_string(),
        }
    }
}

impl DispatchSection {
    /// Relay key with TRADE_RELAY_API_KEY fallback
    pub fn relay_api_key(&self) -> Option<String> {
        secret(&self.relay_api_key, "TRADE_RELAY_API_KEY")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingSection {
    pub interval_secs: u64,
    pub categories: Vec<String>,
    /// Evaluations in flight at once
    pub concurrency: usize,
}

impl Default for PollingSection {
    fn default() -> Self {
        let defaults = PipelineConfig::default();
        Self {
            interval_secs: defaults.poll_interval.as_secs(),
            categories: defaults.categories,
            concurrency: defaults.concurrency,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log to file (in addition to stdout)
    pub log_to_file: bool,
    pub log_file: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
            log_file: "token_vetter.log".to_string(),
        }
    }
}

/// Alerts configuration section (optional)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AlertsSection {
    pub telegram_enabled: bool,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
}

impl AlertsSection {
    /// Bot token with TELEGRAM_BOT_TOKEN fallback
    pub fn telegram_bot_token(&self) -> Option<String> {
        secret(&Some(self.telegram_bot_token.clone()), "TELEGRAM_BOT_TOKEN")
    }

    /// Chat id with TELEGRAM_CHAT_ID fallback
    pub fn telegram_chat_id(&self) -> Option<String> {
        secret(&Some(self.telegram_chat_id.clone()), "TELEGRAM_CHAT_ID")
    }
}

/// Verdict audit log
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditSection {
    pub enabled: bool,
    pub path: String,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "audit/verdicts.jsonl".to_string(),
        }
    }
}

/// Config value if set and non-empty, otherwise the environment variable
fn secret(value: &Option<String>, env_var: &str) -> Option<String> {
    if let Some(ref v) = value {
        if !v.is_empty() {
            return Some(v.clone());
        }
    }
    std::env::var(env_var).ok().filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file (`~` is expanded)
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let expanded = shellexpand::tilde(&path.as_ref().to_string_lossy()).to_string();
    let content = std::fs::read_to_string(expanded)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

fn decimal(value: f64, field: &str) -> Result<Decimal, ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::ValidationError(format!("{} must be finite, got {}", field, value)));
    }
    Decimal::from_str(&value.to_string())
        .map_err(|e| ConfigError::ValidationError(format!("{} is not a valid amount: {}", field, e)))
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Sources
        if self.sources.gmgn_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "gmgn_url cannot be empty (metrics service)".to_string(),
            ));
        }

        if self.sources.listing_provider == ListingProvider::Dexscreener && self.sources.dexscreener_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "dexscreener_url cannot be empty when listing_provider = \"dexscreener\"".to_string(),
            ));
        }

        if self.sources.rugcheck_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "rugcheck_url cannot be empty".to_string(),
            ));
        }

        if self.sources.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }

        // Retry
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "max_attempts must be >= 1".to_string(),
            ));
        }

        if self.retry.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "retry timeout_secs must be > 0".to_string(),
            ));
        }

        // Filters
        if !self.filters.min_volume.is_finite() || self.filters.min_volume < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "min_volume must be >= 0, got {}",
                self.filters.min_volume
            )));
        }

        if !self.filters.min_liquidity_supply_ratio.is_finite() || self.filters.min_liquidity_supply_ratio < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "min_liquidity_supply_ratio must be >= 0, got {}",
                self.filters.min_liquidity_supply_ratio
            )));
        }

        // Ranking
        if !(0.0..=1.0).contains(&self.ranking.action_threshold) {
            return Err(ConfigError::ValidationError(format!(
                "action_threshold must be 0-1, got {}",
                self.ranking.action_threshold
            )));
        }

        // Dispatch
        TradeSizer::try_from(&self.dispatch)?;

        if !self.dispatch.paper && self.dispatch.relay_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "relay_url is required when paper = false".to_string(),
            ));
        }

        // Polling
        if self.polling.categories.is_empty() {
            return Err(ConfigError::ValidationError(
                "categories cannot be empty".to_string(),
            ));
        }

        if self.polling.concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "concurrency must be >= 1".to_string(),
            ));
        }

        if self.polling.interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "interval_secs must be > 0".to_string(),
            ));
        }

        // Alerts
        if self.alerts.telegram_enabled
            && (self.alerts.telegram_bot_token().is_none() || self.alerts.telegram_chat_id().is_none())
        {
            return Err(ConfigError::ValidationError(
                "telegram_enabled requires a bot token and chat id (config or TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID)"
                    .to_string(),
            ));
        }

        if self.audit.enabled && self.audit.path.is_empty() {
            return Err(ConfigError::ValidationError(
                "audit path cannot be empty when audit is enabled".to_string(),
            ));
        }

        Ok(())
    }

    /// Scoring strategy selected by `[scoring] strategy`
    pub fn scoring_strategy(&self) -> Arc<dyn ScoringStrategy> {
        match self.scoring.strategy {
            ScoringKind::RiskScore => Arc::new(RiskScoreStrategy),
            ScoringKind::Model => Arc::new(ModelScoring::new(self.scoring.model.clone())),
        }
    }
}

impl From<&FiltersSection> for FilterConfig {
    fn from(filters: &FiltersSection) -> Self {
        let clean = |list: &[String]| -> HashSet<String> {
            list.iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };

        FilterConfig {
            min_volume: filters.min_volume,
            min_liquidity_supply_ratio: filters.min_liquidity_supply_ratio,
            coin_blacklist: clean(&filters.coin_blacklist),
            dev_blacklist: clean(&filters.dev_blacklist),
        }
    }
}

impl From<&RetrySection> for RetryPolicy {
    fn from(retry: &RetrySection) -> Self {
        RetryPolicy {
            max_attempts: retry.max_attempts,
            delay: Duration::from_secs(retry.delay_secs),
            attempt_timeout: Duration::from_secs(retry.timeout_secs),
        }
    }
}

impl TryFrom<&DispatchSection> for TradeSizer {
    type Error = ConfigError;

    fn try_from(dispatch: &DispatchSection) -> Result<Self, Self::Error> {
        let min_amount = decimal(dispatch.min_buy_amount, "min_buy_amount")?;
        let max_amount = decimal(dispatch.max_buy_amount, "max_buy_amount")?;
        let ranked_fraction = decimal(dispatch.ranked_fraction, "ranked_fraction")?;

        if min_amount <= Decimal::ZERO || min_amount > max_amount {
            return Err(ConfigError::ValidationError(format!(
                "buy bounds must satisfy 0 < min_buy_amount <= max_buy_amount, got {} / {}",
                min_amount, max_amount
            )));
        }

        if ranked_fraction <= Decimal::ZERO || ranked_fraction > Decimal::ONE {
            return Err(ConfigError::ValidationError(format!(
                "ranked_fraction must be in (0, 1], got {}",
                ranked_fraction
            )));
        }

        let rule = match dispatch.sizing {
            SizingMode::Fixed => {
                let amount = decimal(dispatch.fixed_amount, "fixed_amount")?;
                if amount <= Decimal::ZERO {
                    return Err(ConfigError::ValidationError(format!(
                        "fixed_amount must be > 0, got {}",
                        amount
                    )));
                }
                SizingRule::Fixed(amount)
            }
            SizingMode::Price => SizingRule::PriceDerived,
        };

        Ok(TradeSizer {
            min_amount,
            max_amount,
            rule,
            ranked_fraction,
        })
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        PipelineConfig {
            categories: config.polling.categories.clone(),
            poll_interval: Duration::from_secs(config.polling.interval_secs),
            concurrency: config.polling.concurrency,
            max_actions_per_cycle: config.ranking.max_actions_per_cycle,
        }
    }
}
