//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `service_config` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Printing merged and updated configuration
//! - Republishing seed file edits so a running watch picks them up
//!
//! All core functionality is implemented in the library crate.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use service_config::bootstrap::merge_over_defaults;
use service_config::config::Opt;
use service_config::initialization::{init_logger_with, load_seed, sync_seed};
use service_config::{BoundedStore, ConfigCenter};

#[tokio::main]
async fn main() -> Result<()> {
    // SERVICE_CONFIG_NAME / SERVICE_CONFIG_ENV may come from a .env file
    let _ = dotenvy::dotenv();

    let opt = Opt::parse();

    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    let store = load_seed(&opt.seed)
        .await
        .with_context(|| format!("Failed to load seed file {}", opt.seed.display()))?;
    let center = ConfigCenter::new(BoundedStore::with_timeout(
        store.clone(),
        Duration::from_secs(opt.timeout_seconds),
    ));

    let defaults = Value::Object(Default::default());
    let mut merged = defaults.clone();
    let version = center
        .initialize(&opt.service, &opt.environment, &mut merged)
        .await;

    println!("{} v{} ({})", opt.service, version, opt.environment);
    println!(
        "{}",
        serde_json::to_string_pretty(&merged).context("Failed to render configuration")?
    );

    if !opt.watch {
        return Ok(());
    }

    let service = opt.service.clone();
    let handle = center.spawn_watch(&opt.service, &opt.environment, version, move |content| {
        match merge_over_defaults(&service, &defaults, &content) {
            Ok(current) => match serde_json::to_string_pretty(&current) {
                Ok(rendered) => println!("{} updated:\n{}", service, rendered),
                Err(e) => log::error!("Cannot render configuration of {}: {}", service, e),
            },
            Err(e) => log::error!("Cannot apply new configuration of {}: {}", service, e),
        }
    });

    let stop_reload = CancellationToken::new();
    let reload_task = if opt.reload_seconds > 0 {
        let cancel = stop_reload.child_token();
        let seed = opt.seed.clone();
        let period = Duration::from_secs(opt.reload_seconds);
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = sync_seed(&store, &seed).await {
                            log::warn!("Failed to reload {}: {}", seed.display(), e);
                        }
                    }
                    _ = cancel.cancelled() => break,
                }
            }
        }))
    } else {
        None
    };

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    stop_reload.cancel();
    if let Some(task) = reload_task {
        let _ = task.await;
    }
    if let Some(last) = handle.shutdown().await {
        log::info!("Stopped watching {} at v{}", opt.service, last);
    }
    Ok(())
}
