mod cli;
mod health;
mod router;
mod state;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use svitlo_calendar::CalendarClient;
use svitlo_core::Config;
use svitlo_notify::{spawn_update_listener, Broadcaster, ChatTransport, MessageRenderer, TelegramTransport};
use svitlo_store::{open_stores, ScheduleStore, Stores, SubscriptionRegistry};
use svitlo_watcher::{run_command_loop, run_poll_loop, CommandHandler, Poller};

use crate::cli::{Cli, Command};
use crate::state::AppState;

fn load_config() -> Config {
    svitlo_core::config::load_dotenv();
    Config::from_env()
}

// ── Wiring ────────────────────────────────────────────────────────

/// Everything the bot needs at runtime.
struct Bot {
    stores: Stores,
    transport: Arc<TelegramTransport>,
    poller: Arc<Poller>,
    commands: Arc<CommandHandler>,
}

async fn build_bot(config: &Config) -> anyhow::Result<Bot> {
    let client = CalendarClient::from_config(&config.calendar).context("calendar API is not usable")?;
    let tz = client.timezone();

    let stores = open_stores(&config.storage)
        .await
        .with_context(|| format!("failed to open {} store", config.storage.backend))?;
    info!(backend = stores.schedule.backend_name(), "Stores ready");

    let transport = Arc::new(TelegramTransport::from_config(&config.telegram).context("Telegram bot is not configured")?);
    let chat: Arc<dyn ChatTransport> = transport.clone();
    let broadcaster = Arc::new(Broadcaster::from_config(chat.clone(), &config.telegram));
    let renderer = Arc::new(MessageRenderer::new()?);

    let poller = Arc::new(Poller::new(
        Arc::new(client),
        stores.clone(),
        broadcaster,
        renderer.clone(),
        tz,
    ));
    let commands = Arc::new(CommandHandler::new(poller.clone(), chat, renderer));

    Ok(Bot {
        stores,
        transport,
        poller,
        commands,
    })
}

// ── Subcommands ───────────────────────────────────────────────────

async fn serve(config: &Config) -> anyhow::Result<()> {
    let bot = build_bot(config).await?;

    if let Err(e) = bot.commands.register_menu().await {
        warn!(error = %e, "Could not register bot commands");
    }

    let every = Duration::from_secs(config.poller.interval_secs);
    let poll_task = tokio::spawn(run_poll_loop(bot.poller.clone(), every));

    let (rx, listener_task) = spawn_update_listener(bot.transport.clone(), config.telegram.updates_timeout_secs);
    let command_task = tokio::spawn(run_command_loop(bot.commands.clone(), rx));

    let app = router::build_router(Arc::new(AppState::new(bot.stores.schedule.clone())));
    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Liveness endpoint on http://{}", addr);

    let served = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await;

    listener_task.abort();
    command_task.abort();
    poll_task.abort();
    info!("Shut down");

    served.context("HTTP server failed")
}

async fn check(config: &Config) -> anyhow::Result<()> {
    let bot = build_bot(config).await?;
    let outcome = bot.poller.run_cycle().await?;
    println!("{outcome}");
    Ok(())
}

async fn preview(config: &Config) -> anyhow::Result<()> {
    let client = CalendarClient::from_config(&config.calendar).context("calendar API is not usable")?;
    let schedule = client.fetch_schedule_at(chrono::Utc::now()).await?;
    println!("{schedule}");
    Ok(())
}

async fn subscribers(config: &Config) -> anyhow::Result<()> {
    let stores = open_stores(&config.storage).await?;
    let list = stores.subscribers.list().await?;
    println!("{} subscriber(s)", list.len());
    for sub in &list {
        println!("  {}  joined {}", sub.chat_id, sub.joined_at.format("%Y-%m-%d %H:%M"));
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl-C received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.default_log_level())),
        )
        .with_target(false)
        .init();

    let config = load_config();
    config.log_summary();
    tracing::debug!(config = %config.redacted_summary(), "Effective configuration");

    match cli.command() {
        Command::Serve => serve(&config).await,
        Command::Check => check(&config).await,
        Command::Preview => preview(&config).await,
        Command::Subscribers => subscribers(&config).await,
    }
}
