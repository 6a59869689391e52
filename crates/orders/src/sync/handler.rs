//! Consumer notification for newly synced orders

use anyhow::Result;

use crate::models::Order;

/// Receives batches of new or updated orders from the poller
///
/// Only ever called with a non-empty batch. Returning an error (or
/// panicking) leaves the watermark where it was, so the same orders are
/// offered again on the next cycle.
pub trait OrderHandler: Send + Sync {
    fn handle(&self, orders: &[Order]) -> Result<()>;
}

impl<F> OrderHandler for F
where
    F: Fn(&[Order]) -> Result<()> + Send + Sync,
{
    fn handle(&self, orders: &[Order]) -> Result<()> {
        self(orders)
    }
}

/// Handler that ignores every batch
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl OrderHandler for NoopHandler {
    fn handle(&self, _orders: &[Order]) -> Result<()> {
        Ok(())
    }
}
