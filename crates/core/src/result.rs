//! Lookup service response model.
//!
//! The response is kept as an opaque JSON document so that everything the
//! service returns survives a trip through the cache. Only the travel-time
//! durations and the FTTH sub-result are inspected, and every accessor
//! tolerates missing or oddly-typed fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// FTTH status string reported for addresses with fiber available.
pub const FTTH_AVAILABLE: &str = "available";

/// JSON document returned by the lookup service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupResult(Value);

impl LookupResult {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// `travel_times.walking.duration`
    pub fn walking_duration(&self) -> Option<String> {
        self.text_at("/travel_times/walking/duration")
    }

    /// `travel_times.biking.duration`
    pub fn biking_duration(&self) -> Option<String> {
        self.text_at("/travel_times/biking/duration")
    }

    /// Whether the FTTH lookup succeeded (`ftth.IsSuccessful` is truthy).
    pub fn ftth_successful(&self) -> bool {
        self.0.pointer("/ftth/IsSuccessful").is_some_and(is_truthy)
    }

    /// `ftth.Status`, only when the FTTH lookup succeeded.
    pub fn ftth_status(&self) -> Option<String> {
        if !self.ftth_successful() {
            return None;
        }
        self.text_at("/ftth/Status")
    }

    /// Fiber is available at the address.
    pub fn ftth_available(&self) -> Option<bool> {
        self.ftth_status().map(|status| status == FTTH_AVAILABLE)
    }

    fn text_at(&self, pointer: &str) -> Option<String> {
        match self.0.pointer(pointer)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl From<Value> for LookupResult {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for LookupResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// JavaScript truthiness, which is what the service's producers assume.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
