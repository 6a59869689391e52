//! Sync engine for polling orders from the store
//!
//! - `pager` walks paginated order listings
//! - `watermark` computes query boundaries and runs the two fetch modes
//! - `poller` runs the background polling loop

mod handler;
mod pager;
mod poller;
mod watermark;

use std::time::Duration;

use crate::config::SyncConfig;

pub use handler::{NoopHandler, OrderHandler};
pub use pager::{FetchError, PageRequest, Pager};
pub use poller::{PollStats, Poller, SyncLoop, poll_once};
pub use watermark::{
    BACKFILL_WINDOW_HOURS, BOUNDARY_OVERLAP_MINUTES, CREATED_AFTER, MODIFIED_AFTER,
    backfill_lower_bound, fetch_recent_window, fetch_since, incremental_lower_bound,
};

/// Runtime options for the sync engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Wait between polling cycles
    pub poll_interval: Duration,
    /// Wait after a failed cycle before retrying
    pub error_backoff: Duration,
    /// Orders requested per page
    pub page_size: u32,
    /// HTTP request timeout
    pub request_timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for SyncOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.sync_interval),
            error_backoff: Duration::from_secs(config.error_backoff),
            page_size: config.per_page,
            request_timeout: config.request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = SyncOptions::default();
        assert_eq!(options.poll_interval, Duration::from_secs(60));
        assert_eq!(options.error_backoff, Duration::from_secs(60));
        assert_eq!(options.page_size, 100);
        assert_eq!(options.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_options_from_config() {
        let config = SyncConfig {
            sync_interval: 5,
            per_page: 20,
            request_timeout: 10,
            error_backoff: 15,
        };
        let options = SyncOptions::from(&config);
        assert_eq!(options.poll_interval, Duration::from_secs(5));
        assert_eq!(options.error_backoff, Duration::from_secs(15));
        assert_eq!(options.page_size, 20);
        assert_eq!(options.request_timeout, Duration::from_secs(10));
    }
}
