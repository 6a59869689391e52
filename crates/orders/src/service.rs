//! OrderSyncService facade
//!
//! High-level entry point wrapping the API client, the watermark and the
//! background sync loop. None of its methods return errors: failures are
//! logged and reported as `false` or `None`.

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::sync::{Arc, Mutex, PoisonError};

use crate::api::{ApiSlot, OrdersApi, WooCommerceClient};
use crate::config::StoreCredentials;
use crate::models::{Order, Watermark};
use crate::sync::{
    NoopHandler, OrderHandler, Pager, Poller, SyncLoop, SyncOptions, fetch_recent_window,
    fetch_since,
};

/// Resource probed by [`OrderSyncService::initialize`]
const STATUS_PROBE_RESOURCE: &str = "system_status";

/// Main service object for order synchronization
pub struct OrderSyncService {
    /// Shared with the background poller
    api: ApiSlot,
    handler: Arc<dyn OrderHandler>,
    watermark: Arc<Mutex<Watermark>>,
    options: SyncOptions,
    sync_loop: SyncLoop,
}

impl OrderSyncService {
    /// Create a service with no API client yet
    ///
    /// # Arguments
    /// * `options` - Polling interval, back-off, page size and request timeout
    /// * `handler` - Consumer for new orders; `None` discards them
    pub fn new(options: SyncOptions, handler: Option<Arc<dyn OrderHandler>>) -> Self {
        Self {
            api: ApiSlot::new(),
            handler: handler.unwrap_or_else(|| Arc::new(NoopHandler)),
            watermark: Arc::new(Mutex::new(Watermark::new())),
            options,
            sync_loop: SyncLoop::new(),
        }
    }

    /// Create a service around an existing API client
    pub fn with_api(
        api: Arc<dyn OrdersApi>,
        options: SyncOptions,
        handler: Option<Arc<dyn OrderHandler>>,
    ) -> Self {
        let service = Self::new(options, handler);
        service.api.set(api);
        service
    }

    fn pager(&self) -> Pager {
        Pager::new(self.api.get(), self.options.page_size)
    }

    // ========================================================================
    // Connection
    // ========================================================================

    /// Connect to a store and check it responds
    ///
    /// Builds the HTTP client, installs it, and probes the store's status
    /// endpoint. Returns whether the probe succeeded. The client stays
    /// installed even when the probe fails; callers decide whether to go on.
    pub fn initialize(&self, base_url: &str, consumer_key: &str, consumer_secret: &str) -> bool {
        let credentials = StoreCredentials::new(base_url, consumer_key, consumer_secret);
        self.initialize_with(&credentials)
    }

    /// Like [`initialize`](Self::initialize), with full credentials
    pub fn initialize_with(&self, credentials: &StoreCredentials) -> bool {
        let client = Arc::new(WooCommerceClient::new(
            credentials,
            self.options.request_timeout,
        ));
        self.api.set(client.clone());

        match client.get(STATUS_PROBE_RESOURCE, &[]) {
            Ok(response) if response.is_success() => {
                info!("Connected to store at {}", credentials.base_url);
                true
            }
            Ok(response) => {
                warn!(
                    "Store status probe at {} returned status {}",
                    credentials.base_url, response.status
                );
                false
            }
            Err(e) => {
                error!("Failed to initialize store client: {}", e);
                false
            }
        }
    }

    /// Whether an API client has been installed
    pub fn is_initialized(&self) -> bool {
        self.api.is_set()
    }

    // ========================================================================
    // Manual fetches
    // ========================================================================

    /// Fetch orders with arbitrary filters
    ///
    /// Returns `None` if not initialized or on a transport failure.
    pub fn get_orders(&self, filters: &[(String, String)], fetch_all_pages: bool) -> Option<Vec<Order>> {
        match self.pager().fetch(filters, fetch_all_pages) {
            Ok(orders) => Some(orders),
            Err(e) => {
                error!("Order fetch failed: {}", e);
                None
            }
        }
    }

    /// Fetch the first page of orders modified since `since` (with overlap)
    pub fn fetch_orders_since(&self, since: DateTime<Utc>) -> Option<Vec<Order>> {
        fetch_since(&self.pager(), since)
    }

    /// Fetch every order created in the last 24 hours
    pub fn fetch_last_day_orders(&self) -> Option<Vec<Order>> {
        fetch_recent_window(&self.pager())
    }

    // ========================================================================
    // Background sync
    // ========================================================================

    /// Start periodic background sync; no-op if already running
    ///
    /// May be called before [`initialize`](Self::initialize): cycles without
    /// a client fetch nothing, and the loop uses the client from the next
    /// cycle once one is installed.
    pub fn start_sync(&self) {
        let poller = Poller::new(
            self.api.clone(),
            self.handler.clone(),
            self.watermark.clone(),
            &self.options,
        );

        match self.sync_loop.start(poller) {
            Ok(true) => info!(
                "Periodic order sync started (every {}s)",
                self.options.poll_interval.as_secs()
            ),
            Ok(false) => {}
            Err(e) => error!("Failed to spawn order sync thread: {}", e),
        }
    }

    /// Ask background sync to stop after the current cycle
    pub fn stop_sync(&self) {
        if self.sync_loop.stop() {
            info!("Periodic order sync stopped");
        }
    }

    /// Wait for a stopped background sync thread to finish
    pub fn wait_for_sync_exit(&self) {
        self.sync_loop.join();
    }

    pub fn is_syncing(&self) -> bool {
        self.sync_loop.is_running()
    }

    /// Timestamp of the last successful sync cycle
    pub fn last_sync(&self) -> DateTime<Utc> {
        self.watermark
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_sync_at()
    }
}
