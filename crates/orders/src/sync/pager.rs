//! Paged order retrieval
//!
//! Hides the API's page-size limit by walking `page=1, 2, ...` and
//! flattening the results in server order.

use log::{error, info};
use serde_json::Value;
use std::sync::Arc;

use crate::api::{ApiError, OrdersApi};
use crate::models::Order;

/// Collection resource the pager reads from
const ORDERS_RESOURCE: &str = "orders";

/// Why a fetch produced no result at all
///
/// Distinct from an empty `Vec`, which means the server had nothing to give.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Store API client is not initialized")]
    NotInitialized,

    #[error("Failed to fetch orders page {page}: {source}")]
    Api {
        page: u32,
        #[source]
        source: ApiError,
    },
}

/// Query parameters for a single page of orders
///
/// Base parameters sort by date, newest first, across every status. Caller
/// filters are applied on top and replace a base parameter with the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
    pub filters: Vec<(String, String)>,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32, filters: &[(String, String)]) -> Self {
        Self {
            page,
            per_page,
            filters: filters.to_vec(),
        }
    }

    /// Flatten into query pairs
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query: Vec<(String, String)> = [
            ("per_page", self.per_page.to_string()),
            ("page", self.page.to_string()),
            ("orderby", "date".to_string()),
            ("order", "desc".to_string()),
            ("status", "any".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        for (key, value) in &self.filters {
            match query.iter_mut().find(|(k, _)| k == key) {
                Some(existing) => existing.1 = value.clone(),
                None => query.push((key.clone(), value.clone())),
            }
        }

        query
    }
}

/// Walks the orders collection page by page
#[derive(Clone)]
pub struct Pager {
    api: Option<Arc<dyn OrdersApi>>,
    page_size: u32,
}

impl Pager {
    /// Create a pager
    ///
    /// # Arguments
    /// * `api` - Client to issue requests through; `None` if not yet initialized
    /// * `page_size` - Orders per page (clamped to at least 1)
    pub fn new(api: Option<Arc<dyn OrdersApi>>, page_size: u32) -> Self {
        Self {
            api,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetch orders matching `filters`
    ///
    /// With `fetch_all_pages` false only the first page is requested.
    /// Otherwise pages are requested until one comes back short or empty.
    ///
    /// A non-success status ends pagination and returns whatever earlier
    /// pages produced; that page is not retried. A transport or decode
    /// failure discards everything and returns an error.
    pub fn fetch(
        &self,
        filters: &[(String, String)],
        fetch_all_pages: bool,
    ) -> Result<Vec<Order>, FetchError> {
        let api = self.api.as_ref().ok_or(FetchError::NotInitialized)?;

        let mut all_orders: Vec<Order> = Vec::new();
        let mut page = 1;

        loop {
            let request = PageRequest::new(page, self.page_size, filters);

            if fetch_all_pages {
                info!(
                    "Downloading orders page {} (found so far: {})",
                    page,
                    all_orders.len()
                );
            }

            let response = api
                .get(ORDERS_RESOURCE, &request.to_query())
                .map_err(|source| FetchError::Api { page, source })?;

            if !response.is_success() {
                error!(
                    "API error fetching orders page {}: status {}",
                    page, response.status
                );
                break;
            }

            let orders_page = match response.body {
                Some(Value::Array(items)) if !items.is_empty() => items,
                _ => break,
            };

            let page_len = orders_page.len();
            all_orders.extend(orders_page.into_iter().map(Order::from));

            if !fetch_all_pages || page_len < self.page_size as usize {
                break;
            }

            page += 1;
        }

        if fetch_all_pages {
            info!("Download complete: {} orders in total", all_orders.len());
        }

        Ok(all_orders)
    }
}
