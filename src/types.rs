//! Common types used throughout Timeslice CDK
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use std::collections::HashMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

/// A time-bounded extraction partition.
///
/// Maps the configured partition field names (by default `start_time` and
/// `end_time`) to boundary datetimes formatted with the canonical format.
/// Serializes as a flat JSON object.
pub type StreamSlice = HashMap<String, String>;

/// Checkpoint state carried across sync invocations.
///
/// Maps the cursor field name to the highest observed cursor value in its
/// original string form. An empty map means "no prior state".
pub type StreamState = HashMap<String, String>;

// ============================================================================
// Record
// ============================================================================

/// Read-only access to a record's cursor value.
///
/// Extracted records are opaque to the cursor; the only thing it ever reads
/// is the value at the cursor field, as a string. A missing value is not an
/// error (see the record filter).
pub trait Record {
    /// The record's value at `field`, if present and representable as a string
    fn cursor_value(&self, field: &str) -> Option<String>;
}

impl Record for JsonValue {
    fn cursor_value(&self, field: &str) -> Option<String> {
        match self.get(field)? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl Record for StringMap {
    fn cursor_value(&self, field: &str) -> Option<String> {
        self.get(field).cloned()
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for strings where "empty" means "absent".
///
/// Template expressions referencing undefined keys resolve to the empty
/// string; boundary and lookback resolution treat that as no value.
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}
