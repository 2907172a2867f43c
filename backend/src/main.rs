//! Backend entry-point: serves the Mini-App storefront or the Seller App.

mod server;

use actix_web::web;
use clap::Parser;
use mockable::DefaultEnv;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{Adapters, AppSettings, Surface, build_analytics, build_bot_handler, create_server};
use store_backend::domain::ROLLUP_INTERVAL;
use store_backend::inbound::http::health::HealthState;
use store_backend::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use store_backend::outbound::telegram::BotPoller;

/// Command-line options.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// HTTP surface to serve.
    #[arg(value_enum, default_value = "store")]
    surface: Surface,
    /// Apply pending database migrations before serving.
    #[arg(long)]
    migrate: bool,
    /// Answer bot commands via `getUpdates` long polling instead of the webhook.
    #[arg(long)]
    poll_bot: bool,
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    let settings = AppSettings::from_env(&DefaultEnv::new(), cli.surface)
        .map_err(std::io::Error::other)?;
    info!(?settings, "configuration loaded");

    if cli.migrate {
        run_migrations(settings.database_url.clone())
            .await
            .map_err(std::io::Error::other)?;
    }

    let pool = DbPool::new(
        PoolConfig::new(settings.database_url.as_str()).with_max_size(settings.pool_max_size),
    )
    .await
    .map_err(std::io::Error::other)?;
    let adapters = Adapters::new(pool, &settings);

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), &adapters, &settings)?;
    let handle = server.handle();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks: Vec<JoinHandle<()>> = Vec::new();
    if settings.surface == Surface::Seller {
        let analytics = build_analytics(&adapters);
        tasks.push(tokio::spawn(
            analytics.run_rollup(ROLLUP_INTERVAL, shutdown_rx.clone()),
        ));
    }
    if cli.poll_bot {
        match adapters.bot_client.clone() {
            Some(client) => {
                if settings.webhook_secret.is_some() {
                    warn!("bot polling requested while a webhook secret is configured");
                }
                let poller = BotPoller::new(client, build_bot_handler(&adapters, &settings));
                tasks.push(tokio::spawn(poller.run(shutdown_rx.clone())));
            }
            None => warn!("bot polling requested but the telegram client is unavailable"),
        }
    }

    let signal_health = health_state.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown requested");
        signal_health.mark_unhealthy();
        handle.stop(true).await;
    });

    info!(surface = ?settings.surface, addr = %settings.bind_addr, "server started");
    let result = server.await;

    if shutdown_tx.send(true).is_err() {
        info!("no background tasks to stop");
    }
    for task in tasks {
        if let Err(error) = task.await {
            warn!(%error, "background task ended abnormally");
        }
    }
    result
}

async fn ctrl_c() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                () = ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(error) => {
            warn!(%error, "SIGTERM handler unavailable");
            ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    ctrl_c().await;
}
