//! Domain models for order synchronization

mod order;
mod watermark;

pub use order::Order;
pub use watermark::Watermark;
