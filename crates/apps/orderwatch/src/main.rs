//! orderwatch - watches a WooCommerce store for new and updated orders
//!
//! Connects using the configured store credentials, optionally backfills
//! the last day of orders, then polls in the background until Enter is
//! pressed or stdin closes.
//!
//! Usage: `orderwatch [--backfill]`

use anyhow::Result;
use config::ConfigDir;
use log::{error, info, warn};
use orders::{Order, OrderHandler, OrderSyncService, StoreCredentials, SyncConfig, SyncOptions};
use std::sync::Arc;

/// Log one line per order in a delivered batch
fn log_orders(orders: &[Order]) -> Result<()> {
    for order in orders {
        let status = order
            .get("status")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown");
        match order.id() {
            Some(id) => info!("Order #{} ({})", id, status),
            None => info!("Order without id ({})", status),
        }
    }
    Ok(())
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    let config_dir = match config::init() {
        Ok(dir) => Some(dir),
        Err(e) => {
            error!("Failed to initialize config directory: {}", e);
            None
        }
    };

    if let Err(e) = run(config_dir.as_ref()) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(config_dir: Option<&ConfigDir>) -> Result<()> {
    let backfill = std::env::args().skip(1).any(|arg| arg == "--backfill");

    let loaded = match config_dir {
        Some(dir) => StoreCredentials::load_from(dir),
        None => StoreCredentials::from_env(),
    };
    let credentials = match loaded {
        Ok(creds) => creds,
        Err(e) => {
            warn!("Store credentials not found: {}", e);
            if let Some(dir) = config_dir {
                warn!(
                    "To configure store access, either:\n\
                     1. Place your WooCommerce credentials at: {}\n\
                     2. Or set environment variables: WOOCOMMERCE_URL, \
                     WOOCOMMERCE_CONSUMER_KEY and WOOCOMMERCE_CONSUMER_SECRET",
                    StoreCredentials::path_in(dir).display()
                );
            }
            return Err(e);
        }
    };

    let sync_config = match config_dir {
        Some(dir) => SyncConfig::load_from(dir)?,
        None => SyncConfig::default(),
    };
    let options = SyncOptions::from(&sync_config);
    let handler: Arc<dyn OrderHandler> = Arc::new(log_orders);
    let service = OrderSyncService::new(options, Some(handler));

    if !service.initialize_with(&credentials) {
        anyhow::bail!("Could not connect to store at {}", credentials.base_url);
    }

    if backfill {
        match service.fetch_last_day_orders() {
            Some(orders) => {
                info!("Backfilled {} orders from the last 24 hours", orders.len());
                log_orders(&orders)?;
            }
            None => warn!("Backfill failed; continuing with incremental sync"),
        }
    }

    service.start_sync();
    info!("Press Enter to stop");

    let mut line = String::new();
    if let Err(e) = std::io::stdin().read_line(&mut line) {
        warn!("Failed to read stdin: {}", e);
    }

    service.stop_sync();
    service.wait_for_sync_exit();
    info!("orderwatch stopped");
    Ok(())
}
