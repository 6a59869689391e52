//! Store REST API integration
//!
//! This module provides:
//! - The `OrdersApi` trait the sync engine talks to
//! - A WooCommerce HTTP client implementing it

mod client;

pub use client::WooCommerceClient;

use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};

/// Status code and decoded body of an API response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Decoded JSON body; `None` when the body was empty, or was not JSON
    /// on an error response
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    /// Whether the status code is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failure talking to the store
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] ureq::Error),

    #[error("Failed to decode response body (status {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

/// Authenticated read access to a store's REST resources
///
/// Implementations must be safe to share between the background poller
/// and callers fetching on their own thread.
pub trait OrdersApi: Send + Sync {
    /// Perform a GET against `resource` (e.g. `orders`) with query parameters
    ///
    /// Non-success HTTP statuses are returned as responses, not errors.
    /// Network failures and undecodable success bodies are errors.
    fn get(&self, resource: &str, query: &[(String, String)]) -> Result<ApiResponse, ApiError>;
}

/// Replaceable handle to the current API client
///
/// Clones share the same slot, so a client installed after the poller
/// started is picked up on its next cycle.
#[derive(Clone, Default)]
pub struct ApiSlot {
    inner: Arc<RwLock<Option<Arc<dyn OrdersApi>>>>,
}

impl ApiSlot {
    /// An empty slot (not yet initialized)
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot already holding `api`
    pub fn with(api: Arc<dyn OrdersApi>) -> Self {
        let slot = Self::new();
        slot.set(api);
        slot
    }

    /// Install or replace the client
    pub fn set(&self, api: Arc<dyn OrdersApi>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(api);
    }

    /// The client currently installed, if any
    pub fn get(&self) -> Option<Arc<dyn OrdersApi>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_set(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
