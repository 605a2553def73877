//! Action Dispatcher
//!
//! Turns an admitted token into exactly one trade intent and one
//! notification. Both side effects are fire-and-forget: failures are logged
//! and reported in the [`ActionOutcome`], never propagated.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::{DispatchPreset, TokenCandidate, TradeIntent, TradeSide, TradeSizer, Verdict};
use crate::ports::{Notifier, SourceError, TradeRecorder};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DispatchError {
    #[error("Verdict for {0} is not an admission")]
    NotAdmitted(String),

    #[error("Trade recording failed: {0}")]
    TradeFailed(SourceError),

    #[error("Notification failed: {0}")]
    NotifyFailed(SourceError),
}

/// What happened when a token was dispatched
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub intent: TradeIntent,
    pub trade_error: Option<DispatchError>,
    pub notify_error: Option<DispatchError>,
}

impl ActionOutcome {
    pub fn trade_recorded(&self) -> bool {
        self.trade_error.is_none()
    }

    pub fn notified(&self) -> bool {
        self.notify_error.is_none()
    }
}

pub struct ActionDispatcher {
    recorder: Arc<dyn TradeRecorder>,
    notifier: Arc<dyn Notifier>,
    sizer: TradeSizer,
    settlement_symbol: String,
}

impl ActionDispatcher {
    pub fn new(recorder: Arc<dyn TradeRecorder>, notifier: Arc<dyn Notifier>, sizer: TradeSizer) -> Self {
        Self {
            recorder,
            notifier,
            sizer,
            settlement_symbol: "SOL".to_string(),
        }
    }

    pub fn with_settlement_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.settlement_symbol = symbol.into();
        self
    }

    pub fn sizer(&self) -> &TradeSizer {
        &self.sizer
    }

    /// Build the trade intent for a token without side effects
    pub fn plan(&self, token: &TokenCandidate, preset: DispatchPreset) -> TradeIntent {
        TradeIntent {
            token_id: token.id.clone(),
            symbol: token.display_name().to_string(),
            side: TradeSide::Buy,
            amount: self.sizer.amount(token.price, preset),
            preset,
        }
    }

    /// Record the trade intent and notify the operator
    pub async fn dispatch(
        &self,
        token: &TokenCandidate,
        verdict: &Verdict,
        preset: DispatchPreset,
    ) -> Result<ActionOutcome, DispatchError> {
        if !verdict.is_admit() || verdict.token_id != token.id {
            return Err(DispatchError::NotAdmitted(token.id.clone()));
        }

        let intent = self.plan(token, preset);
        tracing::info!("Dispatching {} (score {:.4})", intent, verdict.score);

        let trade_error = match self
            .recorder
            .record_trade(&intent.token_id, intent.amount, intent.side)
            .await
        {
            Ok(()) => None,
            Err(e) => {
                tracing::error!("Failed to record trade for {}: {}", intent.token_id, e);
                Some(DispatchError::TradeFailed(e))
            }
        };

        let message = self.message(token, verdict, &intent);
        let notify_error = match self.notifier.notify(&message).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("Failed to send notification for {}: {}", intent.token_id, e);
                Some(DispatchError::NotifyFailed(e))
            }
        };

        Ok(ActionOutcome {
            intent,
            trade_error,
            notify_error,
        })
    }

    fn message(&self, token: &TokenCandidate, verdict: &Verdict, intent: &TradeIntent) -> String {
        match intent.preset {
            DispatchPreset::Direct => format!(
                "GOOD token found: {} ({}) - Buying {} {} worth",
                token.display_name(),
                token.id,
                intent.amount,
                self.settlement_symbol
            ),
            DispatchPreset::Ranked => format!(
                "High probability token: {} ({}) - score {:.2}% - Buying {} {} worth",
                token.display_name(),
                token.id,
                verdict.score * 100.0,
                intent.amount,
                self.settlement_symbol
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RejectReason;
    use crate::ports::{MockNotifier, MockTradeRecorder};
    use rust_decimal_macros::dec;

    fn token() -> TokenCandidate {
        TokenCandidate::new("Mint1", "ONE", "pumped").with_price(3.0)
    }

    #[tokio::test]
    async fn test_ranked_dispatch_uses_half_amount() {
        let mut recorder = MockTradeRecorder::new();
        recorder
            .expect_record_trade()
            .withf(|id, amount, side| id == "Mint1" && *amount == dec!(0.05) && *side == TradeSide::Buy)
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|msg| msg.contains("High probability token: ONE") && msg.contains("0.05 SOL"))
            .times(1)
            .returning(|_| Ok(()));

        let dispatcher = ActionDispatcher::new(Arc::new(recorder), Arc::new(notifier), TradeSizer::default());
        let outcome = dispatcher
            .dispatch(&token(), &Verdict::admit("Mint1", 0.85), DispatchPreset::Ranked)
            .await
            .unwrap();

        assert_eq!(outcome.intent.amount, dec!(0.05));
        assert!(outcome.trade_recorded());
        assert!(outcome.notified());
    }

    #[tokio::test]
    async fn test_direct_dispatch_uses_full_amount() {
        let mut recorder = MockTradeRecorder::new();
        recorder
            .expect_record_trade()
            .withf(|_, amount, _| *amount == dec!(0.1))
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|msg| msg.starts_with("GOOD token found: ONE (Mint1)"))
            .times(1)
            .returning(|_| Ok(()));

        let dispatcher = ActionDispatcher::new(Arc::new(recorder), Arc::new(notifier), TradeSizer::default());
        let outcome = dispatcher
            .dispatch(&token(), &Verdict::admit("Mint1", 0.5), DispatchPreset::Direct)
            .await
            .unwrap();

        assert_eq!(outcome.intent.amount, dec!(0.1));
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_abort() {
        let mut recorder = MockTradeRecorder::new();
        recorder.expect_record_trade().times(1).returning(|_, _, _| Ok(()));
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .times(1)
            .returning(|_| Err(SourceError::Transport("telegram down".into())));

        let dispatcher = ActionDispatcher::new(Arc::new(recorder), Arc::new(notifier), TradeSizer::default());
        let outcome = dispatcher
            .dispatch(&token(), &Verdict::admit("Mint1", 0.9), DispatchPreset::Ranked)
            .await
            .unwrap();

        assert!(outcome.trade_recorded());
        assert!(!outcome.notified());
    }

    #[tokio::test]
    async fn test_trade_failure_still_notifies_once() {
        let mut recorder = MockTradeRecorder::new();
        recorder
            .expect_record_trade()
            .times(1)
            .returning(|_, _, _| Err(SourceError::HttpStatus { status: 500, body: String::new() }));
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(1).returning(|_| Ok(()));

        let dispatcher = ActionDispatcher::new(Arc::new(recorder), Arc::new(notifier), TradeSizer::default());
        let outcome = dispatcher
            .dispatch(&token(), &Verdict::admit("Mint1", 0.9), DispatchPreset::Direct)
            .await
            .unwrap();

        assert!(!outcome.trade_recorded());
        assert!(outcome.notified());
    }

    #[tokio::test]
    async fn test_rejected_verdict_is_not_dispatched() {
        let mut recorder = MockTradeRecorder::new();
        recorder.expect_record_trade().never();
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().never();

        let dispatcher = ActionDispatcher::new(Arc::new(recorder), Arc::new(notifier), TradeSizer::default());
        let result = dispatcher
            .dispatch(&token(), &Verdict::reject("Mint1", RejectReason::MinVolume, 0.9), DispatchPreset::Direct)
            .await;

        assert_eq!(result, Err(DispatchError::NotAdmitted("Mint1".to_string())));
    }

    #[test]
    fn test_plan_with_custom_settlement() {
        let dispatcher = ActionDispatcher::new(
            Arc::new(MockTradeRecorder::new()),
            Arc::new(MockNotifier::new()),
            TradeSizer::default(),
        )
        .with_settlement_symbol("USDC");

        let intent = dispatcher.plan(&token(), DispatchPreset::Ranked);
        assert_eq!(intent.symbol, "ONE");
        assert_eq!(intent.amount, dec!(0.05));
    }
}
