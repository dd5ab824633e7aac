use catchbot::config::{Config, StoreKind};
use catchbot::db::Db;
use catchbot::game::dispatcher::Dispatcher;
use catchbot::game::scheduler::SpawnScheduler;
use catchbot::net::telegram::TelegramClient;
use catchbot::util::shutdown;
use catchbot::{Registry, Repos};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Parser)]
#[command(name = "catchbot", version, about = "Catch-the-character chat game")]
struct Args {
    /// Config file (defaults to $CATCHBOT_CONFIG, then ./catchbot.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Storage backend; overrides the config file and CATCHBOT_STORE
    #[arg(long, value_enum)]
    store: Option<StoreKind>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();
    let mut cfg = Config::load(args.config.as_deref())?;
    if let Some(store) = args.store {
        cfg.store = store;
    }
    let cfg = Arc::new(cfg);

    let repos = match cfg.store {
        StoreKind::Postgres => {
            let db = Arc::new(Db::new(&cfg.database_url)?);
            db.init().await?;
            Repos::postgres(db)
        }
        StoreKind::Memory => {
            tracing::warn!("using the in-memory store, nothing survives a restart");
            Repos::memory()
        }
    };

    let token = cfg
        .telegram
        .token
        .clone()
        .ok_or_else(|| anyhow::anyhow!("BOT_TOKEN is not set"))?;
    let telegram = Arc::new(TelegramClient::new(
        &token,
        &cfg.telegram.api_base,
        Duration::from_secs(cfg.telegram.poll_timeout_secs),
    )?);

    let registry = Arc::new(Registry::new(cfg.clone(), repos, telegram.clone()));
    let catalog_size = registry.services.catalog.count().await?;
    if catalog_size == 0 {
        tracing::warn!("catalog is empty; spawns are skipped until items are uploaded");
    }

    let (shutdown_tx, shutdown_rx) = shutdown::channel();
    shutdown::trigger_on_ctrl_c(shutdown_tx);

    let (scheduler, scheduler_handle) = SpawnScheduler::new(registry.clone(), shutdown_rx.clone());
    let dispatcher = Dispatcher::new(registry.clone(), scheduler_handle);
    let (event_tx, event_rx) = mpsc::channel(256);

    let scheduler_jh = tokio::spawn(scheduler.run());
    let dispatcher_jh = tokio::spawn(dispatcher.run(event_rx, shutdown_rx.clone()));
    let poll_rx = shutdown_rx.clone();
    let poll_jh = tokio::spawn(async move {
        telegram.poll(event_tx, poll_rx).await;
    });

    tracing::info!(store = ?cfg.store, items = catalog_size, "catchbot running");

    // All three only return on shutdown
    if let Err(e) = tokio::try_join!(poll_jh, dispatcher_jh, scheduler_jh) {
        tracing::error!(error = %e, "task failed");
    }
    registry.services.sessions.finish_rewards().await;

    tracing::info!("bye");
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, prelude::*};

    let _ = color_eyre::install();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,catchbot=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::uptime()),
        )
        .with(tracing_error::ErrorLayer::default())
        .init();
}
