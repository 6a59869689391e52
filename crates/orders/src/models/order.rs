//! Opaque order record

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single order as returned by the store API
///
/// The sync engine never looks inside an order; it is passed through to
/// the consumer exactly as the server produced it. The accessors below are
/// conveniences for consumers only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Order(Value);

impl Order {
    /// Wrap a raw JSON value
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Numeric order ID, if the record carries one
    pub fn id(&self) -> Option<u64> {
        self.0.get("id").and_then(Value::as_u64)
    }

    /// Look up a top-level field by name
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Order {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
