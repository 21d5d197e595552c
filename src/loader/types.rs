//! Loader types
//!
//! Declarative incremental sync definition types for YAML parsing.

use crate::cursor::{Clock, DatetimeCursor, RequestOption};
use crate::error::Result;
use crate::types::JsonValue;
use serde::{Deserialize, Serialize};

// ============================================================================
// Incremental Sync Definition
// ============================================================================

/// Top-level incremental sync definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IncrementalSyncDefinition {
    /// Datetime-based cursor over a record field
    #[serde(rename = "datetime")]
    Datetime(DatetimeCursorDefinition),
}

impl IncrementalSyncDefinition {
    /// Build a runnable cursor from this definition
    pub fn build(&self, config: JsonValue) -> Result<DatetimeCursor> {
        match self {
            Self::Datetime(def) => def.build(config),
        }
    }
}

// ============================================================================
// Datetime Cursor Definition
// ============================================================================

/// Datetime cursor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatetimeCursorDefinition {
    /// Lower bound of the sync window (datetime or template)
    pub start_datetime: String,
    /// Upper bound of the sync window; defaults to "now" when omitted
    #[serde(default)]
    pub end_datetime: Option<String>,
    /// Record field holding the cursor value (may be a template)
    pub cursor_field: String,
    /// Canonical datetime format for boundaries and emitted slices
    pub datetime_format: String,
    /// Additional accepted formats for record cursor values
    #[serde(default)]
    pub cursor_datetime_formats: Vec<String>,
    /// Slice width as an ISO 8601 duration (e.g. `P1D`)
    #[serde(default)]
    pub step: Option<String>,
    /// Smallest representable increment of the cursor (e.g. `PT0.000001S`)
    #[serde(default)]
    pub cursor_granularity: Option<String>,
    /// How far to rewind behind the effective start (duration or template)
    #[serde(default)]
    pub lookback_window: Option<String>,
    /// Slice field name for the lower bound
    #[serde(default)]
    pub partition_field_start: Option<String>,
    /// Slice field name for the upper bound
    #[serde(default)]
    pub partition_field_end: Option<String>,
    /// Inject the slice start into outgoing requests
    #[serde(default)]
    pub start_time_option: Option<RequestOption>,
    /// Inject the slice end into outgoing requests
    #[serde(default)]
    pub end_time_option: Option<RequestOption>,
}

impl DatetimeCursorDefinition {
    /// Build a runnable cursor from this definition
    pub fn build(&self, config: JsonValue) -> Result<DatetimeCursor> {
        self.builder(config).build()
    }

    /// Build a cursor with a caller-provided clock
    pub fn build_with_clock(&self, config: JsonValue, clock: Box<dyn Clock>) -> Result<DatetimeCursor> {
        self.builder(config).clock(clock).build()
    }

    fn builder(&self, config: JsonValue) -> crate::cursor::DatetimeCursorBuilder {
        let mut builder = DatetimeCursor::builder(
            &self.start_datetime,
            &self.cursor_field,
            &self.datetime_format,
        )
        .cursor_datetime_formats(self.cursor_datetime_formats.clone())
        .config(config);

        if let Some(end) = &self.end_datetime {
            builder = builder.end_datetime(end);
        }
        if let Some(step) = &self.step {
            builder = builder.step(step);
        }
        if let Some(granularity) = &self.cursor_granularity {
            builder = builder.cursor_granularity(granularity);
        }
        if let Some(lookback) = &self.lookback_window {
            builder = builder.lookback_window(lookback);
        }
        if let Some(field) = &self.partition_field_start {
            builder = builder.partition_field_start(field);
        }
        if let Some(field) = &self.partition_field_end {
            builder = builder.partition_field_end(field);
        }
        if let Some(option) = &self.start_time_option {
            builder = builder.start_time_option(option.clone());
        }
        if let Some(option) = &self.end_time_option {
            builder = builder.end_time_option(option.clone());
        }

        builder
    }
}
