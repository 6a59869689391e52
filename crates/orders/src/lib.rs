//! Orders crate - polling sync engine for e-commerce orders
//!
//! This crate provides:
//! - An opaque order model and the in-memory sync watermark
//! - A WooCommerce REST client behind the `OrdersApi` trait
//! - A pager that flattens paginated order listings
//! - Incremental (modified-since) and backfill (last 24h) fetches
//! - A background polling loop with failure isolation
//!
//! Order contents are never interpreted; they are passed to the consumer
//! exactly as the store returned them.

pub mod api;
pub mod config;
pub mod models;
pub mod service;
pub mod sync;

pub use api::{ApiError, ApiResponse, ApiSlot, OrdersApi, WooCommerceClient};
pub use config::{StoreCredentials, SyncConfig};
pub use models::{Order, Watermark};
pub use service::OrderSyncService;
pub use sync::{
    // Fetching
    FetchError, PageRequest, Pager, fetch_recent_window, fetch_since,
    // Background loop
    NoopHandler, OrderHandler, PollStats, Poller, SyncLoop, SyncOptions, poll_once,
};
