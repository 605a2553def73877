//! Trade recorders
//!
//! The agent never executes swaps itself. [`TradeRelayClient`] forwards the
//! intent to an external trading bot over HTTP; [`PaperTradeRecorder`] keeps
//! intents in memory and logs them.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::http::{join_url, JsonClient};
use crate::domain::TradeSide;
use crate::ports::{SourceError, TradeRecorder};

#[derive(Debug, Clone)]
pub struct TradeRelayConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

pub struct TradeRelayClient {
    config: TradeRelayConfig,
    http: JsonClient,
}

#[derive(Debug, Serialize)]
struct TradeRequest<'a> {
    token_address: &'a str,
    amount: Decimal,
    action: TradeSide,
}

impl TradeRelayClient {
    pub fn new(config: TradeRelayConfig) -> Result<Self, SourceError> {
        if config.base_url.is_empty() {
            return Err(SourceError::Config("Trade relay URL is required".into()));
        }
        let http = JsonClient::new(config.timeout)?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl TradeRecorder for TradeRelayClient {
    async fn record_trade(&self, token_id: &str, amount: Decimal, side: TradeSide) -> Result<(), SourceError> {
        let mut request = self
            .http
            .post(&join_url(&self.config.base_url, "trade"))
            .json(&TradeRequest {
                token_address: token_id,
                amount,
                action: side,
            });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        self.http.send(request).await?;
        tracing::info!("Relayed {} of {} ({})", side, token_id, amount);
        Ok(())
    }
}

/// A trade intent captured by the paper recorder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperTrade {
    pub token_id: String,
    pub amount: Decimal,
    pub side: TradeSide,
}

/// Records intents without contacting anything
#[derive(Debug, Default)]
pub struct PaperTradeRecorder {
    trades: Mutex<Vec<PaperTrade>>,
}

impl PaperTradeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded intent, in order
    pub fn trades(&self) -> Vec<PaperTrade> {
        self.trades.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TradeRecorder for PaperTradeRecorder {
    async fn record_trade(&self, token_id: &str, amount: Decimal, side: TradeSide) -> Result<(), SourceError> {
        tracing::info!("[PAPER] {} {} of {}", side, amount, token_id);
        let mut trades = self
            .trades
            .lock()
            .map_err(|_| SourceError::Data("paper ledger poisoned".into()))?;
        trades.push(PaperTrade {
            token_id: token_id.to_string(),
            amount,
            side,
        });
        Ok(())
    }
}
