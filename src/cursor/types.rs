//! Cursor types and traits

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request Options
// ============================================================================

/// Where a slice boundary is injected into an outgoing request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOptionType {
    /// Query-string parameter
    RequestParameter,
    /// HTTP header
    Header,
    /// Key in a JSON request body
    BodyJson,
    /// Key in a form-encoded request body
    BodyData,
}

/// Describes how one slice boundary is surfaced to the remote API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOption {
    /// Injection point
    pub inject_into: RequestOptionType,
    /// Name of the parameter/header/body key
    pub field_name: String,
}

impl RequestOption {
    /// Create a new request option
    pub fn new(inject_into: RequestOptionType, field_name: impl Into<String>) -> Self {
        Self {
            inject_into,
            field_name: field_name.into(),
        }
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Source of the current time.
///
/// `stream_slices` resolves "now" exactly once per invocation through this
/// trait, so tests can freeze it.
pub trait Clock: Send + Sync {
    /// The current instant in UTC
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a fixed instant, for deterministic runs
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
