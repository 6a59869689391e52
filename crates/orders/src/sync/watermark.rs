//! Query boundaries for incremental polling and backfill
//!
//! Pure boundary functions plus the two fetch entry points built on them.
//! Both fetches swallow failures into `None` after logging.

use chrono::{DateTime, Duration, Utc};
use log::error;

use super::pager::Pager;
use crate::models::Order;

/// Filter key for "modified after" (incremental polling)
pub const MODIFIED_AFTER: &str = "modified_after";

/// Filter key for "created after" (backfill)
pub const CREATED_AFTER: &str = "after";

/// Backward shift applied to the watermark before querying
pub const BOUNDARY_OVERLAP_MINUTES: i64 = 5;

/// Size of the backfill window
pub const BACKFILL_WINDOW_HOURS: i64 = 24;

/// Lower bound for an incremental poll: the watermark minus the overlap
pub fn incremental_lower_bound(watermark: DateTime<Utc>) -> DateTime<Utc> {
    watermark - Duration::minutes(BOUNDARY_OVERLAP_MINUTES)
}

/// Lower bound for a backfill: `now` minus the backfill window
pub fn backfill_lower_bound(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(BACKFILL_WINDOW_HOURS)
}

fn time_filter(key: &str, bound: DateTime<Utc>) -> Vec<(String, String)> {
    vec![(key.to_string(), bound.to_rfc3339())]
}

/// Fetch the freshest page of orders modified since `since` (minus the overlap)
///
/// Only the first page is requested: polling is frequent, so one page
/// normally holds everything that changed.
pub fn fetch_since(pager: &Pager, since: DateTime<Utc>) -> Option<Vec<Order>> {
    let filters = time_filter(MODIFIED_AFTER, incremental_lower_bound(since));

    match pager.fetch(&filters, false) {
        Ok(orders) => Some(orders),
        Err(e) => {
            error!("Incremental order fetch failed: {}", e);
            None
        }
    }
}

/// Fetch every order created in the last 24 hours, across all pages
///
/// Ignores the watermark; intended for one-off catch-up.
pub fn fetch_recent_window(pager: &Pager) -> Option<Vec<Order>> {
    let filters = time_filter(CREATED_AFTER, backfill_lower_bound(Utc::now()));

    match pager.fetch(&filters, true) {
        Ok(orders) => Some(orders),
        Err(e) => {
            error!("Backfill of last day's orders failed: {}", e);
            None
        }
    }
}
