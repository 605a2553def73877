//! Vetting Pipeline Integration Tests
//!
//! Drive the public pipeline API end to end with the fixture-backed adapters:
//! 1. Filter outcomes for each rejection reason
//! 2. Ranking, high-confidence dispatch and trade sizing
//! 3. Transport failures, retries and inconclusive verdicts
//! 4. Manual evaluation and the audit trail
//!
//! All tests are deterministic (no network calls).

use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use tempfile::NamedTempFile;

use token_vetter::adapters::{
    FixtureSet, MemoryAuditSink, PaperTradeRecorder, RecordingNotifier, StaticSafetySource,
};
use token_vetter::application::{
    ActionDispatcher, Pipeline, PipelineConfig, ResilientExecutor, RetryPolicy, SafetyFailurePolicy, TokenEvaluator,
};
use token_vetter::domain::{
    EnrichedMetrics, FilterChain, FilterConfig, Outcome, RankedBatch, RankingEngine, RejectReason, RiskScoreStrategy,
    SafetyReport, SafetyStatus, TokenCandidate, TradeSide, TradeSizer, Verdict,
};

// ============================================================================
// Test Fixtures
// ============================================================================

const MAX_ATTEMPTS: u32 = 3;

/// A listing that passes every filter on its own
fn healthy(id: &str, symbol: &str) -> TokenCandidate {
    TokenCandidate::new(id, symbol, "pumped")
        .with_name(format!("{} Token", symbol))
        .with_price(0.002)
        .with_volume(50_000.0)
        .with_liquidity(500_000.0)
        .with_total_supply(1_000.0)
}

fn good(id: &str, risk_score: f64) -> SafetyReport {
    SafetyReport::new(id, SafetyStatus::Good, risk_score)
}

fn fixtures(listings: Vec<TokenCandidate>, safety: Vec<SafetyReport>) -> FixtureSet {
    let mut by_category = BTreeMap::new();
    by_category.insert("pumped".to_string(), listings);
    FixtureSet {
        listings: by_category,
        safety,
        metrics: Vec::new(),
        unreachable: Vec::new(),
    }
}

struct Harness {
    pipeline: Pipeline,
    safety: Arc<StaticSafetySource>,
    recorder: Arc<PaperTradeRecorder>,
    notifier: Arc<RecordingNotifier>,
    audit: Arc<MemoryAuditSink>,
}

fn harness_with(fixtures: &FixtureSet, filters: FilterConfig, policy: SafetyFailurePolicy) -> Harness {
    let safety = Arc::new(fixtures.safety_source());
    let recorder = Arc::new(PaperTradeRecorder::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let audit = Arc::new(MemoryAuditSink::default());

    let executor = Arc::new(ResilientExecutor::new(RetryPolicy {
        max_attempts: MAX_ATTEMPTS,
        delay: Duration::from_millis(1),
        attempt_timeout: Duration::from_secs(1),
    }));

    let evaluator = TokenEvaluator::new(
        safety.clone(),
        Arc::new(fixtures.metrics_source()),
        executor.clone(),
        FilterChain::new(filters),
        Arc::new(RiskScoreStrategy),
    )
    .with_failure_policy(policy);

    let dispatcher = ActionDispatcher::new(recorder.clone(), notifier.clone(), TradeSizer::default());

    let pipeline = Pipeline::new(
        Arc::new(fixtures.listing_source()),
        executor,
        Arc::new(evaluator),
        RankingEngine::new(0.7),
        dispatcher,
        PipelineConfig {
            categories: fixtures.categories(),
            poll_interval: Duration::from_millis(10),
            concurrency: 4,
            max_actions_per_cycle: 5,
        },
    )
    .with_audit(audit.clone());

    Harness {
        pipeline,
        safety,
        recorder,
        notifier,
        audit,
    }
}

fn harness(fixtures: &FixtureSet) -> Harness {
    harness_with(fixtures, FilterConfig::default(), SafetyFailurePolicy::Inconclusive)
}

fn verdict_for<'a>(batch: &'a RankedBatch, id: &str) -> &'a Verdict {
    batch
        .entries
        .iter()
        .map(|e| &e.verdict)
        .chain(batch.excluded.iter().map(|(_, v)| v))
        .find(|v| v.token_id == id)
        .unwrap_or_else(|| panic!("no verdict for {}", id))
}

async fn cycle(h: &Harness) -> RankedBatch {
    h.pipeline.run_cycle(&["pumped".to_string()]).await
}

// ============================================================================
// Filter Outcomes
// ============================================================================

#[tokio::test]
async fn test_blacklisted_symbol_rejected_before_lookups() {
    let scam = healthy("ScamMint", "SCAM").with_volume(100_000.0);
    let set = fixtures(vec![scam], vec![good("ScamMint", 0.99)]);

    let filters = FilterConfig {
        coin_blacklist: HashSet::from(["SCAM".to_string()]),
        ..Default::default()
    };
    let h = harness_with(&set, filters, SafetyFailurePolicy::Inconclusive);

    let batch = cycle(&h).await;

    assert_eq!(verdict_for(&batch, "ScamMint").reason(), Some(RejectReason::Blacklist));
    assert_eq!(h.safety.calls(), 0);
    assert!(h.recorder.trades().is_empty());
}

#[tokio::test]
async fn test_dev_blacklist_rejects() {
    let token = healthy("DevMint", "DEV").with_dev_wallet("RugDev111");
    let set = fixtures(vec![token], vec![good("DevMint", 0.9)]);

    let filters = FilterConfig {
        dev_blacklist: HashSet::from(["RugDev111".to_string()]),
        ..Default::default()
    };
    let h = harness_with(&set, filters, SafetyFailurePolicy::Inconclusive);

    let batch = cycle(&h).await;
    assert_eq!(verdict_for(&batch, "DevMint").reason(), Some(RejectReason::Blacklist));
}

#[tokio::test]
async fn test_low_volume_rejected() {
    let set = fixtures(vec![healthy("LowVol", "LOW").with_volume(10.0)], vec![good("LowVol", 0.9)]);
    let h = harness(&set);

    let batch = cycle(&h).await;
    assert_eq!(verdict_for(&batch, "LowVol").reason(), Some(RejectReason::MinVolume));
}

#[tokio::test]
async fn test_bad_safety_status_rejected() {
    let set = fixtures(
        vec![healthy("BadMint", "BAD")],
        vec![SafetyReport::new("BadMint", SafetyStatus::Bad, 0.95)],
    );
    let h = harness(&set);

    let batch = cycle(&h).await;
    let verdict = verdict_for(&batch, "BadMint");
    assert_eq!(verdict.reason(), Some(RejectReason::SafetyStatus));
    assert_eq!(verdict.score, 0.95);
}

#[tokio::test]
async fn test_unknown_safety_status_rejected() {
    let set = fixtures(
        vec![healthy("Unk", "UNK")],
        vec![SafetyReport::new("Unk", SafetyStatus::Unknown, 0.5)],
    );
    let h = harness(&set);

    let batch = cycle(&h).await;
    assert_eq!(verdict_for(&batch, "Unk").reason(), Some(RejectReason::SafetyStatus));
}

#[tokio::test]
async fn test_thin_liquidity_rejected() {
    let token = healthy("Thin", "THIN").with_liquidity(50.0).with_total_supply(1_000.0);
    let set = fixtures(vec![token], vec![good("Thin", 0.9)]);
    let h = harness(&set);

    let batch = cycle(&h).await;
    assert_eq!(verdict_for(&batch, "Thin").reason(), Some(RejectReason::SupplyConcentration));
}

#[tokio::test]
async fn test_zero_supply_fails_closed() {
    let token = healthy("Zero", "ZERO").with_liquidity(1e12).with_total_supply(0.0);
    let set = fixtures(vec![token], vec![good("Zero", 0.9)]);
    let h = harness(&set);

    let batch = cycle(&h).await;
    assert_eq!(verdict_for(&batch, "Zero").reason(), Some(RejectReason::SupplyConcentration));
}

// ============================================================================
// Ranking and Dispatch
// ============================================================================

#[tokio::test]
async fn test_high_confidence_admission_dispatched_with_half_amount() {
    let set = fixtures(vec![healthy("Gem", "GEM")], vec![good("Gem", 0.85)]);
    let h = harness(&set);

    let batch = cycle(&h).await;

    assert_eq!(batch.entries.len(), 1);
    let entry = &batch.entries[0];
    assert_eq!(entry.verdict.outcome, Outcome::Admit);
    assert_eq!(entry.verdict.score, 0.85);
    assert!(entry.high_confidence);

    let trades = h.recorder.trades();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].token_id, "Gem");
    assert_eq!(trades[0].amount, dec!(0.05));
    assert_eq!(trades[0].side, TradeSide::Buy);

    let messages = h.notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("GEM"));
}

#[tokio::test]
async fn test_low_confidence_admission_not_dispatched() {
    let set = fixtures(vec![healthy("Meh", "MEH")], vec![good("Meh", 0.4)]);
    let h = harness(&set);

    let batch = cycle(&h).await;

    assert_eq!(batch.entries.len(), 1);
    assert!(!batch.entries[0].high_confidence);
    assert!(h.recorder.trades().is_empty());
    assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn test_ranking_order_and_tie_break() {
    let set = fixtures(
        vec![
            healthy("Ccc", "C"),
            healthy("Aaa", "A"),
            healthy("Bbb", "B"),
            healthy("Ddd", "D"),
        ],
        vec![good("Ccc", 0.5), good("Aaa", 0.5), good("Bbb", 0.9), good("Ddd", 0.1)],
    );
    let h = harness(&set);

    let first: Vec<String> = cycle(&h).await.entries.iter().map(|e| e.candidate.id.clone()).collect();
    let second: Vec<String> = cycle(&h).await.entries.iter().map(|e| e.candidate.id.clone()).collect();

    assert_eq!(first, vec!["Bbb", "Aaa", "Ccc", "Ddd"]);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_dispatch_capped_per_cycle() {
    let ids: Vec<String> = (0..7).map(|i| format!("Mint{}", i)).collect();
    let set = fixtures(
        ids.iter().map(|id| healthy(id, id)).collect(),
        ids.iter().enumerate().map(|(i, id)| good(id, 0.8 + i as f64 * 0.01)).collect(),
    );
    let h = harness(&set);

    let batch = cycle(&h).await;

    assert_eq!(batch.high_confidence().count(), 7);
    let traded: Vec<String> = h.recorder.trades().into_iter().map(|t| t.token_id).collect();
    assert_eq!(traded, vec!["Mint6", "Mint5", "Mint4", "Mint3", "Mint2"]);
}

// ============================================================================
// Failures and Retries
// ============================================================================

#[tokio::test]
async fn test_unreachable_safety_is_inconclusive_after_retries() {
    let mut set = fixtures(vec![healthy("Down", "DOWN"), healthy("Up", "UP")], vec![good("Up", 0.3)]);
    set.unreachable.push("Down".to_string());
    let h = harness(&set);

    let batch = cycle(&h).await;

    let verdict = verdict_for(&batch, "Down");
    assert!(verdict.is_inconclusive());
    assert_eq!(verdict.reason(), None);
    assert_eq!(batch.inconclusive_count(), 1);

    // Exactly MAX_ATTEMPTS for the failing token, one for the healthy one
    assert_eq!(h.safety.calls(), MAX_ATTEMPTS as usize + 1);

    // The batch still completes for other tokens
    assert_eq!(batch.entries.len(), 1);
    assert_eq!(batch.entries[0].candidate.id, "Up");
}

#[tokio::test]
async fn test_unreachable_safety_rejected_under_strict_policy() {
    let mut set = fixtures(vec![healthy("Down", "DOWN")], Vec::new());
    set.unreachable.push("Down".to_string());
    let h = harness_with(&set, FilterConfig::default(), SafetyFailurePolicy::Reject);

    let batch = cycle(&h).await;
    assert_eq!(verdict_for(&batch, "Down").reason(), Some(RejectReason::SafetyCheckFailed));
}

#[tokio::test]
async fn test_unknown_category_contributes_nothing() {
    let set = fixtures(vec![healthy("Gem", "GEM")], vec![good("Gem", 0.85)]);
    let h = harness(&set);

    let batch = h
        .pipeline
        .run_cycle(&["missing".to_string(), "pumped".to_string()])
        .await;
    assert_eq!(batch.entries.len(), 1);
}

// ============================================================================
// Manual Evaluation and Audit
// ============================================================================

#[tokio::test]
async fn test_evaluate_one_uses_metrics_and_full_amount() {
    let mut set = fixtures(Vec::new(), vec![good("Manual1", 0.6).with_name("Manual Token")]);
    set.metrics.push(EnrichedMetrics {
        token_id: "Manual1".to_string(),
        top_holders: 300,
        trading_volume: 25_000.0,
        price_history: vec![0.01, 0.011, 0.012, 0.013, 0.015],
        liquidity: Some(80_000.0),
        total_supply: Some(1_000.0),
    });
    let h = harness(&set);

    let verdict = h.pipeline.evaluate_one("Manual1").await;

    assert!(verdict.is_admit());
    assert_eq!(verdict.score, 0.6);

    let trades = h.recorder.trades();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].amount, dec!(0.1));

    let messages = h.notifier.messages();
    assert!(messages[0].starts_with("GOOD token found: Manual Token (Manual1)"));
}

#[tokio::test]
async fn test_evaluate_one_without_metrics_is_rejected() {
    let set = fixtures(Vec::new(), vec![good("Bare", 0.9)]);
    let h = harness(&set);

    // No volume from anywhere: metrics default to zero
    let verdict = h.pipeline.evaluate_one("Bare").await;
    assert_eq!(verdict.reason(), Some(RejectReason::MinVolume));
    assert!(h.recorder.trades().is_empty());
}

#[tokio::test]
async fn test_repeated_evaluation_is_idempotent() {
    let set = fixtures(vec![healthy("Gem", "GEM")], vec![good("Gem", 0.85)]);
    let h = harness(&set);

    let first = verdict_for(&cycle(&h).await, "Gem").clone();
    let second = verdict_for(&cycle(&h).await, "Gem").clone();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_every_candidate_is_audited_once() {
    let mut set = fixtures(
        vec![
            healthy("Gem", "GEM"),
            healthy("LowVol", "LOW").with_volume(1.0),
            healthy("Down", "DOWN"),
            // Duplicate listing is evaluated once
            healthy("Gem", "GEM"),
        ],
        vec![good("Gem", 0.85), good("LowVol", 0.9)],
    );
    set.unreachable.push("Down".to_string());
    let h = harness(&set);

    cycle(&h).await;

    let mut audited: Vec<String> = h.audit.records().into_iter().map(|(c, _)| c.id).collect();
    audited.sort();
    assert_eq!(audited, vec!["Down", "Gem", "LowVol"]);
}

#[tokio::test]
async fn test_cancelled_pipeline_starts_no_work() {
    let set = fixtures(vec![healthy("Gem", "GEM")], vec![good("Gem", 0.85)]);
    let h = harness(&set);

    h.pipeline.shutdown();
    let batch = cycle(&h).await;

    assert!(batch.is_empty());
    assert_eq!(h.safety.calls(), 0);
}

#[tokio::test]
async fn test_fixture_file_replay() {
    let json = r#"{
        "listings": {
            "pumped": [
                {"id": "Mint1", "symbol": "ONE", "volume_24h": 5000, "liquidity": 90000, "total_supply": 100},
                {"id": "Mint2", "symbol": "TWO", "volume_24h": 5}
            ]
        },
        "safety": [
            {"token_id": "Mint1", "status": "GOOD", "risk_score": 0.91},
            {"token_id": "Mint2", "status": "GOOD", "risk_score": 0.99}
        ]
    }"#;
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let set = FixtureSet::load(file.path()).unwrap();
    let h = harness(&set);

    let batch = h.pipeline.run_cycle(&set.categories()).await;

    assert_eq!(batch.entries.len(), 1);
    assert_eq!(batch.entries[0].candidate.id, "Mint1");
    assert_eq!(verdict_for(&batch, "Mint2").reason(), Some(RejectReason::MinVolume));
    assert_eq!(h.recorder.trades().len(), 1);
}
