//! Token Vetter - Listing feed screening agent
//!
//! Wires the configured adapters into the pipeline and runs the CLI commands.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use token_vetter::adapters::cli::{CliApp, Command, EvaluateCmd, ReplayCmd, RunCmd};
use token_vetter::adapters::{
    DexscreenerClient, DexscreenerConfig, FixtureSet, GmgnClient, GmgnConfig, JsonlAuditSink, LogNotifier,
    PaperTradeRecorder, RugcheckClient, RugcheckConfig, TelegramConfig, TelegramNotifier, TradeRelayClient,
    TradeRelayConfig,
};
use token_vetter::application::{ActionDispatcher, Pipeline, PipelineConfig, ResilientExecutor, RetryPolicy, TokenEvaluator};
use token_vetter::config::{load_config, Config, ListingProvider};
use token_vetter::domain::{FilterChain, FilterConfig, Outcome, RankedBatch, RankingEngine, TradeSizer, Verdict};
use token_vetter::ports::{AuditSink, ListingSource, MetricsSource, Notifier, SafetyReportSource, TradeRecorder};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in the config file)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    let config = load_config(&app.config)
        .with_context(|| format!("Failed to load configuration from {}", app.config.display()))?;
    init_logging(&app, &config)?;
    let config_path = app.config.clone();

    match app.command {
        Command::Run(cmd) => run_command(config, cmd).await,
        Command::Evaluate(cmd) => evaluate_command(config, cmd).await,
        Command::Replay(cmd) => replay_command(config, cmd).await,
        Command::CheckConfig => check_config_command(&config_path, &config),
    }
}

fn init_logging(app: &CliApp, config: &Config) -> Result<()> {
    let level = if app.debug {
        "debug"
    } else if app.verbose {
        "info"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = if config.logging.log_to_file {
        let path = shellexpand::tilde(&config.logging.log_file).to_string();
        if let Some(parent) = Path::new(&path).parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path))?;
        Some(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    Ok(())
}

/// External collaborators of one pipeline
struct Collaborators {
    listings: Arc<dyn ListingSource>,
    safety: Arc<dyn SafetyReportSource>,
    metrics: Arc<dyn MetricsSource>,
    recorder: Arc<dyn TradeRecorder>,
    notifier: Arc<dyn Notifier>,
    audit: Option<Arc<dyn AuditSink>>,
}

fn http_collaborators(config: &Config, force_paper: bool) -> Result<Collaborators> {
    let sources = &config.sources;
    let timeout = sources.request_timeout();

    let gmgn = Arc::new(
        GmgnClient::new(GmgnConfig {
            base_url: sources.gmgn_url.clone(),
            api_key: sources.gmgn_api_key(),
            timeout,
        })
        .context("Failed to create GMGN client")?,
    );

    let listings: Arc<dyn ListingSource> = match sources.listing_provider {
        ListingProvider::Gmgn => gmgn.clone(),
        ListingProvider::Dexscreener => Arc::new(
            DexscreenerClient::new(DexscreenerConfig {
                base_url: sources.dexscreener_url.clone(),
                chain_id: sources.dexscreener_chain.clone(),
                timeout,
            })
            .context("Failed to create Dexscreener client")?,
        ),
    };

    let safety = Arc::new(
        RugcheckClient::new(RugcheckConfig {
            base_url: sources.rugcheck_url.clone(),
            api_key: sources.rugcheck_api_key(),
            timeout,
        })
        .context("Failed to create RugCheck client")?,
    );

    let recorder: Arc<dyn TradeRecorder> = if config.dispatch.paper || force_paper {
        tracing::warn!("PAPER MODE - trade intents are only logged");
        Arc::new(PaperTradeRecorder::new())
    } else {
        Arc::new(
            TradeRelayClient::new(TradeRelayConfig {
                base_url: config.dispatch.relay_url.clone(),
                api_key: config.dispatch.relay_api_key(),
                timeout,
            })
            .context("Failed to create trade relay client")?,
        )
    };

    Ok(Collaborators {
        listings,
        safety,
        metrics: gmgn,
        recorder,
        notifier: notifier(config)?,
        audit: audit_sink(config),
    })
}

fn notifier(config: &Config) -> Result<Arc<dyn Notifier>> {
    let alerts = &config.alerts;
    if !alerts.telegram_enabled {
        return Ok(Arc::new(LogNotifier));
    }
    let telegram = TelegramNotifier::new(TelegramConfig {
        bot_token: alerts.telegram_bot_token().unwrap_or_default(),
        chat_id: alerts.telegram_chat_id().unwrap_or_default(),
        timeout: config.sources.request_timeout(),
    })
    .context("Failed to create Telegram notifier")?;
    Ok(Arc::new(telegram))
}

fn audit_sink(config: &Config) -> Option<Arc<dyn AuditSink>> {
    config.audit.enabled.then(|| {
        let path = shellexpand::tilde(&config.audit.path).to_string();
        tracing::info!("Auditing verdicts to {}", path);
        Arc::new(JsonlAuditSink::new(path)) as Arc<dyn AuditSink>
    })
}

fn build_pipeline(config: &Config, collaborators: Collaborators) -> Result<Pipeline> {
    let executor = Arc::new(ResilientExecutor::new(RetryPolicy::from(&config.retry)));

    let evaluator = TokenEvaluator::new(
        collaborators.safety,
        collaborators.metrics,
        executor.clone(),
        FilterChain::new(FilterConfig::from(&config.filters)),
        config.scoring_strategy(),
    )
    .with_failure_policy(config.filters.safety_failure_policy);

    let sizer = TradeSizer::try_from(&config.dispatch).context("Invalid dispatch configuration")?;
    let dispatcher = ActionDispatcher::new(collaborators.recorder, collaborators.notifier, sizer)
        .with_settlement_symbol(config.dispatch.settlement_symbol.clone());

    let pipeline = Pipeline::new(
        collaborators.listings,
        executor,
        Arc::new(evaluator),
        RankingEngine::new(config.ranking.action_threshold),
        dispatcher,
        PipelineConfig::from(config),
    );

    Ok(match collaborators.audit {
        Some(audit) => pipeline.with_audit(audit),
        None => pipeline,
    })
}

/// Cancel `token` on Ctrl+C
fn spawn_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        token.cancel();
    });
}

async fn run_command(mut config: Config, cmd: RunCmd) -> Result<()> {
    if let Some(categories) = cmd.categories.filter(|c| !c.is_empty()) {
        config.polling.categories = categories;
    }

    let pipeline = build_pipeline(&config, http_collaborators(&config, cmd.paper)?)?;
    spawn_ctrl_c(pipeline.shutdown_token());

    if cmd.once {
        let batch = pipeline.run_cycle(&config.polling.categories).await;
        print_batch(&batch);
    } else {
        pipeline.run().await;
    }

    tracing::info!("Token vetter stopped");
    Ok(())
}

async fn evaluate_command(config: Config, cmd: EvaluateCmd) -> Result<()> {
    let pipeline = build_pipeline(&config, http_collaborators(&config, cmd.paper)?)?;
    let verdict = pipeline.evaluate_one(&cmd.address).await;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        println!("{}", describe(&verdict));
    }
    Ok(())
}

async fn replay_command(mut config: Config, cmd: ReplayCmd) -> Result<()> {
    let fixtures = FixtureSet::load(&cmd.fixtures)
        .with_context(|| format!("Failed to load fixtures from {}", cmd.fixtures.display()))?;

    // Offline: nothing to wait for between attempts
    config.retry.delay_secs = 0;

    let recorder = Arc::new(PaperTradeRecorder::new());
    let collaborators = Collaborators {
        listings: Arc::new(fixtures.listing_source()),
        safety: Arc::new(fixtures.safety_source()),
        metrics: Arc::new(fixtures.metrics_source()),
        recorder: recorder.clone(),
        notifier: Arc::new(LogNotifier),
        audit: audit_sink(&config),
    };

    let pipeline = build_pipeline(&config, collaborators)?;
    spawn_ctrl_c(pipeline.shutdown_token());

    let batch = pipeline.run_cycle(&fixtures.categories()).await;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
    } else {
        print_batch(&batch);
        for trade in recorder.trades() {
            println!("  [PAPER] {} {} of {}", trade.side, trade.amount, trade.token_id);
        }
    }
    Ok(())
}

fn check_config_command(path: &Path, config: &Config) -> Result<()> {
    println!("✓ Configuration valid: {}", path.display());
    println!("  Listing provider: {:?}", config.sources.listing_provider);
    println!("  Categories: {}", config.polling.categories.join(", "));
    println!(
        "  Retry: {} attempts, {}s delay, {}s timeout",
        config.retry.max_attempts, config.retry.delay_secs, config.retry.timeout_secs
    );
    println!("  Scoring: {:?}, action threshold {}", config.scoring.strategy, config.ranking.action_threshold);
    println!("  Mode: {}", if config.dispatch.paper { "Paper" } else { "Relay" });
    println!("  Telegram alerts: {}", config.alerts.telegram_enabled);
    println!("  Audit: {}", if config.audit.enabled { config.audit.path.as_str() } else { "disabled" });
    Ok(())
}

fn describe(verdict: &Verdict) -> String {
    match verdict.outcome {
        Outcome::Admit => format!("ADMIT {} (score {:.4})", verdict.token_id, verdict.score),
        Outcome::Reject(reason) => format!("REJECT {} ({}, score {:.4})", verdict.token_id, reason, verdict.score),
        Outcome::Inconclusive => format!(
            "INCONCLUSIVE {} ({})",
            verdict.token_id,
            verdict.detail.as_deref().unwrap_or("no detail")
        ),
    }
}

fn print_batch(batch: &RankedBatch) {
    println!("Ranked ({}):", batch.entries.len());
    for (rank, entry) in batch.entries.iter().enumerate() {
        println!(
            "  {:>2}. {:<12} {} score {:.4}{}",
            rank + 1,
            entry.candidate.display_name(),
            entry.candidate.id,
            entry.verdict.score,
            if entry.high_confidence { " *" } else { "" }
        );
    }
    if !batch.excluded.is_empty() {
        println!("Excluded ({}):", batch.excluded.len());
        for (_, verdict) in &batch.excluded {
            println!("  {}", describe(verdict));
        }
    }
}
