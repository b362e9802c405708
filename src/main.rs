use anyhow::Context;
use clap::Parser;
use signalbot::api::build_market_data;
use signalbot::config::{Cli, Settings};
use signalbot::engine::{Engine, EngineConfig};
use signalbot::notify::{LogNotifier, Notifier, TelegramNotifier};
use signalbot::persistence::{MemoryTradeLog, RedisTradeLog, TradeLog};
use signalbot::server::{self, AppState};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let settings = Settings::load()
        .and_then(|s| s.with_cli(&cli))
        .context("Invalid configuration")?;

    tracing::info!("🤖 signalbot starting for {}", settings.asset_label);
    tracing::info!(
        "  Poll: {:?} | Bars: {} | RR: {}",
        settings.poll_interval,
        settings.bar_limit,
        settings
            .manual_rr
            .map(|rr| format!("{:.2} (manual)", rr))
            .unwrap_or_else(|| "auto".to_string())
    );

    // ========================================================================
    // Collaborators
    // ========================================================================
    let market = build_market_data(&settings)?;
    let notifier = build_notifier(&settings)?;
    let trade_log = build_trade_log(&settings).await;

    let engine = Engine::new(
        EngineConfig::from_settings(&settings),
        market,
        notifier,
        trade_log.clone(),
    );

    let app_state = Arc::new(AppState {
        shared: engine.shared(),
        trade_log,
    });

    // ========================================================================
    // Tasks
    // ========================================================================
    let engine_task = tokio::spawn(engine.run());

    let port = settings.port;
    let server_task = tokio::spawn(async move { server::serve(app_state, port).await });

    tracing::info!("✅ Engine and API spawned");
    tracing::info!("\nPress Ctrl+C to stop...\n");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("\n⚠️  Received Ctrl+C, shutting down...");
        }
        result = engine_task => {
            tracing::error!("Engine loop exited: {:?}", result);
        }
        result = server_task => {
            tracing::error!("API server exited: {:?}", result);
        }
    }

    tracing::info!("👋 signalbot stopped");
    Ok(())
}

// ============================================================================
// Initialization Functions
// ============================================================================

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("signalbot=info,tower_http=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_notifier(settings: &Settings) -> anyhow::Result<Arc<dyn Notifier>> {
    match settings.telegram() {
        Some((token, chat_id)) => {
            tracing::info!("Notifications via Telegram (chat {})", chat_id);
            Ok(Arc::new(TelegramNotifier::new(token, chat_id)?))
        }
        None => {
            tracing::info!("Telegram not configured, notifications go to the log");
            Ok(Arc::new(LogNotifier))
        }
    }
}

async fn build_trade_log(settings: &Settings) -> Arc<dyn TradeLog> {
    if let Some(url) = &settings.redis_url {
        match RedisTradeLog::connect(url, &settings.asset_label).await {
            Ok(log) => {
                tracing::info!("Trade log: Redis ({})", log.key());
                return Arc::new(log);
            }
            Err(e) => {
                tracing::warn!("⚠️  Redis unavailable ({:#}), using in-memory trade log", e);
            }
        }
    }

    tracing::info!("Trade log: in-memory");
    Arc::new(MemoryTradeLog::new())
}
