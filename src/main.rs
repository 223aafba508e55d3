use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use tracing::info;

use routewatch::app::{self, Collectors};
use routewatch::{RouteWatchConfig, Scheduler, logging};

fn config_path_from_args() -> Result<Option<PathBuf>> {
    let mut args = std::env::args().skip(1);
    match (args.next().as_deref(), args.next()) {
        (None, _) => Ok(None),
        (Some("--config"), Some(path)) => Ok(Some(PathBuf::from(path))),
        (Some(other), _) => bail!("Unexpected argument '{other}'. Usage: routewatch [--config <path>]"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = RouteWatchConfig::load_from_path(config_path_from_args()?)
        .context("Failed to load configuration")?;
    logging::init(&config.logging)?;

    info!(
        "RouteWatch {} collecting {} routes and {} weather locations every {} minutes",
        routewatch::VERSION,
        config.collection.routes.len(),
        config.collection.weather.len(),
        config.scheduler.interval_minutes
    );

    let collectors = Collectors::connect(&config).await?;

    if config.scheduler.collect_on_startup {
        app::run_once(&collectors, &config.collection).await;
    }

    let scheduler = Scheduler::new(config.scheduler.tick());
    app::register_jobs(
        &scheduler,
        &collectors,
        &config.collection,
        config.scheduler.interval(),
    )?;

    shutdown_signal().await;
    info!("Shutdown signal received");
    scheduler.shutdown(config.scheduler.shutdown_timeout()).await;
    Ok(())
}

/// Wait for SIGINT or SIGTERM (Unix) or Ctrl+C (cross-platform fallback).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => {}
                    _ = sigterm.recv() => {}
                }
            }
            _ => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
