//! Datetime-based cursor implementation

use super::types::{Clock, RequestOption, RequestOptionType, SystemClock};
use crate::datetime::{self, IsoDuration};
use crate::error::{Error, Result};
use crate::template::{self, TemplateContext};
use crate::types::{
    JsonObject, JsonValue, OptionStringExt, Record, StreamSlice, StreamState, StringMap,
};
use chrono::{DateTime, Utc};
use std::fmt;
use tracing::{debug, warn};

/// Default field name for a slice's lower bound
pub const DEFAULT_PARTITION_FIELD_START: &str = "start_time";

/// Default field name for a slice's upper bound
pub const DEFAULT_PARTITION_FIELD_END: &str = "end_time";

// ============================================================================
// Cursor
// ============================================================================

/// Incremental cursor that slices a stream into time-bounded partitions.
///
/// A cursor instance is created per stream per sync. It is mutated only by
/// [`set_initial_state`](Self::set_initial_state) and
/// [`close_slice`](Self::close_slice); everything else is a read.
pub struct DatetimeCursor {
    config: JsonValue,
    start_datetime: String,
    end_datetime: Option<String>,
    step: Option<IsoDuration>,
    cursor_granularity: Option<IsoDuration>,
    cursor_field: String,
    datetime_format: String,
    cursor_datetime_formats: Vec<String>,
    lookback_window: Option<String>,
    partition_field_start: String,
    partition_field_end: String,
    /// Whether the user configured `partition_field_end` explicitly.
    /// A user-specified partition end participates in the close-slice merge
    /// even when a record is present.
    partition_field_end_from_user: bool,
    start_time_option: Option<RequestOption>,
    end_time_option: Option<RequestOption>,
    clock: Box<dyn Clock>,
    state: StreamState,
    /// Highest observed cursor value, in its original string form
    cursor: Option<String>,
}

impl DatetimeCursor {
    /// Start building a cursor from the three required fields
    pub fn builder(
        start_datetime: impl Into<String>,
        cursor_field: impl Into<String>,
        datetime_format: impl Into<String>,
    ) -> DatetimeCursorBuilder {
        DatetimeCursorBuilder {
            start_datetime: start_datetime.into(),
            cursor_field: cursor_field.into(),
            datetime_format: datetime_format.into(),
            end_datetime: None,
            step: None,
            cursor_granularity: None,
            cursor_datetime_formats: Vec::new(),
            lookback_window: None,
            partition_field_start: None,
            partition_field_end: None,
            start_time_option: None,
            end_time_option: None,
            config: JsonValue::Null,
            clock: None,
        }
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Load or replace stream state. Idempotent.
    pub fn set_initial_state(&mut self, state: StreamState) {
        let ctx = TemplateContext {
            config: &self.config,
            stream_state: &state,
            today: self.clock.now().date_naive(),
        };
        let field = template::resolve(&self.cursor_field, &ctx);
        self.cursor = state.get(&field).cloned();
        self.state = state;
    }

    /// Snapshot of the current state as `{cursor_field: value}`.
    ///
    /// Empty until a slice has been closed or initial state was provided.
    pub fn get_stream_state(&self) -> StreamState {
        let mut state = StreamState::new();
        if let Some(cursor) = &self.cursor {
            let ctx = self.context(self.clock.now());
            let field = template::resolve(&self.cursor_field, &ctx);
            state.insert(field, cursor.clone());
        }
        state
    }

    // ========================================================================
    // Slice generation
    // ========================================================================

    /// Produce the ordered sequence of time-bounded slices for this sync.
    ///
    /// "Now" is resolved exactly once per invocation; an open-ended stream
    /// (no `end_datetime`) ends there, and a configured end later than now
    /// is clamped to it.
    pub fn stream_slices(&self) -> Result<Vec<StreamSlice>> {
        let now = self.clock.now();
        let ctx = self.context(now);

        let start = self
            .resolve_boundary(&self.start_datetime, &ctx)?
            .ok_or_else(|| Error::invalid_value("start_datetime", "resolved to empty"))?;
        let end = match &self.end_datetime {
            Some(template) => self.resolve_boundary(template, &ctx)?.unwrap_or(now),
            None => now,
        };
        let effective_end = end.min(now);

        let field = self.cursor_field_name(&ctx)?;
        let state_start = match self.state.get(&field) {
            Some(value) => self.parse_boundary(value)?,
            None => start,
        };
        let mut effective_start = state_start.max(start);
        if let Some(lookback) = self.resolve_lookback(&ctx)? {
            effective_start = lookback.subtract_from(effective_start);
        }

        debug!(start = %effective_start, end = %effective_end, "computed sync window");

        if effective_start > effective_end {
            // Nothing to sync; emit a single point slice at the window end
            return Ok(vec![self.build_slice(effective_end, effective_end)?]);
        }

        let (Some(step), Some(granularity)) = (self.step, self.cursor_granularity) else {
            return Ok(vec![self.build_slice(effective_start, effective_end)?]);
        };

        let mut slices = Vec::new();
        let mut cursor = effective_start;
        while cursor <= effective_end {
            let next = step.add_to(cursor);
            let slice_end = granularity.subtract_from(next).min(effective_end);
            slices.push(self.build_slice(cursor, slice_end)?);
            cursor = next;
        }

        debug!(count = slices.len(), "generated stream slices");
        Ok(slices)
    }

    /// Fold a closed slice's observed maximum into state.
    ///
    /// The stored cursor never decreases: the previous maximum always
    /// participates in the merge. The string representation of whichever
    /// candidate wins is preserved as-is.
    pub fn close_slice(
        &mut self,
        slice: &StreamSlice,
        latest_record: Option<&dyn Record>,
    ) -> Result<()> {
        let ctx = self.context(self.clock.now());
        let field = self.cursor_field_name(&ctx)?;
        let formats = self.record_formats();

        let mut candidates: Vec<String> = Vec::new();
        if let Some(prev) = &self.cursor {
            candidates.push(prev.clone());
        }
        // The slice's partition end caps the merge when no record was seen,
        // or when the user explicitly configured the partition end field
        if latest_record.is_none() || self.partition_field_end_from_user {
            if let Some(end) = slice.get(&self.partition_field_end) {
                candidates.push(end.clone());
            }
        }
        if let Some(record) = latest_record {
            if let Some(value) = record.cursor_value(&field) {
                candidates.push(value);
            }
        }

        let mut best: Option<(String, DateTime<Utc>)> = None;
        for candidate in candidates {
            let parsed = datetime::parse_any(&candidate, &formats)?;
            match &best {
                // On ties the earlier candidate keeps its representation
                Some((_, max)) if parsed <= *max => {}
                _ => best = Some((candidate, parsed)),
            }
        }

        if let Some((value, _)) = best {
            debug!(cursor = %value, "closed slice");
            self.cursor = Some(value);
        }
        Ok(())
    }

    // ========================================================================
    // Record filtering
    // ========================================================================

    /// Whether a record's cursor value falls inside the effective sync
    /// window. Records without a cursor value are always synced.
    ///
    /// The window is `[max(start, state), end]` with no lookback applied;
    /// an absent end is unbounded.
    pub fn should_be_synced(&self, record: &dyn Record) -> Result<bool> {
        let now = self.clock.now();
        let ctx = self.context(now);
        let field = self.cursor_field_name(&ctx)?;

        let Some(value) = record.cursor_value(&field) else {
            warn!(
                cursor_field = %field,
                "record has no cursor value, syncing it anyway"
            );
            return Ok(true);
        };
        let parsed = datetime::parse_any(&value, &self.record_formats())?;

        let start = self
            .resolve_boundary(&self.start_datetime, &ctx)?
            .ok_or_else(|| Error::invalid_value("start_datetime", "resolved to empty"))?;
        let state_start = match self.state.get(&field) {
            Some(state_value) => self.parse_boundary(state_value)?,
            None => start,
        };
        let lower = start.max(state_start);
        let upper = match &self.end_datetime {
            Some(template) => self.resolve_boundary(template, &ctx)?,
            None => None,
        };

        Ok(parsed >= lower && upper.is_none_or(|hi| parsed <= hi))
    }

    /// Whether record `a`'s cursor value is at least record `b`'s.
    ///
    /// A record without a cursor value compares lowest: `b` missing wins
    /// for `a`, `a` missing loses.
    pub fn is_greater_than_or_equal(&self, a: &dyn Record, b: &dyn Record) -> Result<bool> {
        let ctx = self.context(self.clock.now());
        let field = self.cursor_field_name(&ctx)?;
        let formats = self.record_formats();

        let Some(b_value) = b.cursor_value(&field) else {
            return Ok(true);
        };
        let Some(a_value) = a.cursor_value(&field) else {
            return Ok(false);
        };

        let a_parsed = datetime::parse_any(&a_value, &formats)?;
        let b_parsed = datetime::parse_any(&b_value, &formats)?;
        Ok(a_parsed >= b_parsed)
    }

    // ========================================================================
    // Request options
    // ========================================================================

    /// Query parameters derived from a slice
    pub fn get_request_params(&self, slice: &StreamSlice) -> StringMap {
        self.request_options(RequestOptionType::RequestParameter, slice)
    }

    /// Headers derived from a slice
    pub fn get_request_headers(&self, slice: &StreamSlice) -> StringMap {
        self.request_options(RequestOptionType::Header, slice)
    }

    /// JSON body entries derived from a slice
    pub fn get_request_body_json(&self, slice: &StreamSlice) -> JsonObject {
        self.request_options(RequestOptionType::BodyJson, slice)
            .into_iter()
            .map(|(k, v)| (k, JsonValue::String(v)))
            .collect()
    }

    /// Form body entries derived from a slice
    pub fn get_request_body_data(&self, slice: &StreamSlice) -> StringMap {
        self.request_options(RequestOptionType::BodyData, slice)
    }

    fn request_options(&self, target: RequestOptionType, slice: &StreamSlice) -> StringMap {
        let mut options = StringMap::new();
        let pairs = [
            (&self.start_time_option, &self.partition_field_start),
            (&self.end_time_option, &self.partition_field_end),
        ];
        for (option, partition_field) in pairs {
            let Some(option) = option else { continue };
            if option.inject_into != target {
                continue;
            }
            if let Some(value) = slice.get(partition_field) {
                options.insert(option.field_name.clone(), value.clone());
            }
        }
        options
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn context(&self, now: DateTime<Utc>) -> TemplateContext<'_> {
        TemplateContext {
            config: &self.config,
            stream_state: &self.state,
            today: now.date_naive(),
        }
    }

    fn cursor_field_name(&self, ctx: &TemplateContext<'_>) -> Result<String> {
        let field = template::resolve(&self.cursor_field, ctx);
        if field.is_empty() {
            return Err(Error::invalid_value("cursor_field", "resolved to empty"));
        }
        Ok(field)
    }

    /// Candidate formats for record cursor values: canonical format first,
    /// then any extra cursor formats
    fn record_formats(&self) -> Vec<String> {
        let mut formats = vec![self.datetime_format.clone()];
        for f in &self.cursor_datetime_formats {
            if !formats.contains(f) {
                formats.push(f.clone());
            }
        }
        formats
    }

    /// Candidate formats for configured boundaries and state values.
    /// Falls back to the built-in set so date-only and `today_utc()` values
    /// parse under any canonical format.
    fn boundary_formats(&self) -> Vec<String> {
        let mut formats = self.record_formats();
        for f in datetime::DEFAULT_FORMATS {
            if !formats.iter().any(|known| known == f) {
                formats.push((*f).to_string());
            }
        }
        formats
    }

    /// Resolve a possibly-templated boundary and parse it.
    /// An empty resolution means "absent".
    fn resolve_boundary(
        &self,
        template: &str,
        ctx: &TemplateContext<'_>,
    ) -> Result<Option<DateTime<Utc>>> {
        let Some(resolved) = template::resolve(template, ctx).none_if_empty() else {
            return Ok(None);
        };
        Ok(Some(self.parse_boundary(&resolved)?))
    }

    fn parse_boundary(&self, text: &str) -> Result<DateTime<Utc>> {
        datetime::parse_any(text, &self.boundary_formats())
    }

    fn resolve_lookback(&self, ctx: &TemplateContext<'_>) -> Result<Option<IsoDuration>> {
        let Some(raw) = &self.lookback_window else {
            return Ok(None);
        };
        let Some(resolved) = template::resolve(raw, ctx).none_if_empty() else {
            return Ok(None);
        };
        Ok(Some(IsoDuration::parse(&resolved)?))
    }

    fn build_slice(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<StreamSlice> {
        let mut slice = StreamSlice::new();
        slice.insert(
            self.partition_field_start.clone(),
            datetime::format_datetime(start, &self.datetime_format)?,
        );
        slice.insert(
            self.partition_field_end.clone(),
            datetime::format_datetime(end, &self.datetime_format)?,
        );
        Ok(slice)
    }
}

impl fmt::Debug for DatetimeCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatetimeCursor")
            .field("start_datetime", &self.start_datetime)
            .field("end_datetime", &self.end_datetime)
            .field("step", &self.step)
            .field("cursor_granularity", &self.cursor_granularity)
            .field("cursor_field", &self.cursor_field)
            .field("datetime_format", &self.datetime_format)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`DatetimeCursor`].
///
/// Cross-field constraints are validated in [`build`](Self::build): `step`
/// and `cursor_granularity` must be provided together (both absent selects
/// single-slice mode), and the step must be at least as large as the
/// granularity.
pub struct DatetimeCursorBuilder {
    start_datetime: String,
    cursor_field: String,
    datetime_format: String,
    end_datetime: Option<String>,
    step: Option<String>,
    cursor_granularity: Option<String>,
    cursor_datetime_formats: Vec<String>,
    lookback_window: Option<String>,
    partition_field_start: Option<String>,
    partition_field_end: Option<String>,
    start_time_option: Option<RequestOption>,
    end_time_option: Option<RequestOption>,
    config: JsonValue,
    clock: Option<Box<dyn Clock>>,
}

impl DatetimeCursorBuilder {
    /// Set the end datetime (template or value). Absent means "now at
    /// invocation time".
    #[must_use]
    pub fn end_datetime(mut self, end: impl Into<String>) -> Self {
        self.end_datetime = Some(end.into());
        self
    }

    /// Set the step duration (e.g. `P1D`)
    #[must_use]
    pub fn step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    /// Set the cursor granularity (e.g. `PT0.000001S`)
    #[must_use]
    pub fn cursor_granularity(mut self, granularity: impl Into<String>) -> Self {
        self.cursor_granularity = Some(granularity.into());
        self
    }

    /// Set additional accepted formats for record cursor values
    #[must_use]
    pub fn cursor_datetime_formats(mut self, formats: Vec<String>) -> Self {
        self.cursor_datetime_formats = formats;
        self
    }

    /// Set the lookback window (duration, possibly templated)
    #[must_use]
    pub fn lookback_window(mut self, lookback: impl Into<String>) -> Self {
        self.lookback_window = Some(lookback.into());
        self
    }

    /// Override the slice field name for the lower bound
    #[must_use]
    pub fn partition_field_start(mut self, field: impl Into<String>) -> Self {
        self.partition_field_start = Some(field.into());
        self
    }

    /// Override the slice field name for the upper bound
    #[must_use]
    pub fn partition_field_end(mut self, field: impl Into<String>) -> Self {
        self.partition_field_end = Some(field.into());
        self
    }

    /// Inject the slice start into outgoing requests
    #[must_use]
    pub fn start_time_option(mut self, option: RequestOption) -> Self {
        self.start_time_option = Some(option);
        self
    }

    /// Inject the slice end into outgoing requests
    #[must_use]
    pub fn end_time_option(mut self, option: RequestOption) -> Self {
        self.end_time_option = Some(option);
        self
    }

    /// Set the connector configuration templates may reference
    #[must_use]
    pub fn config(mut self, config: JsonValue) -> Self {
        self.config = config;
        self
    }

    /// Replace the wall clock (tests freeze it)
    #[must_use]
    pub fn clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate the configuration and build the cursor
    pub fn build(self) -> Result<DatetimeCursor> {
        let step = self
            .step
            .as_deref()
            .map(IsoDuration::parse)
            .transpose()?;
        let cursor_granularity = self
            .cursor_granularity
            .as_deref()
            .map(IsoDuration::parse)
            .transpose()?;

        match (step, cursor_granularity) {
            (Some(_), None) => {
                return Err(Error::config(
                    "'step' requires 'cursor_granularity' to be set",
                ));
            }
            (None, Some(_)) => {
                return Err(Error::config(
                    "'cursor_granularity' requires 'step' to be set",
                ));
            }
            (Some(s), Some(g)) if s.approx_micros() < g.approx_micros() => {
                return Err(Error::config(format!(
                    "step {s} is smaller than cursor granularity {g}"
                )));
            }
            _ => {}
        }

        if self.start_datetime.is_empty() {
            return Err(Error::missing_field("start_datetime"));
        }
        if self.cursor_field.is_empty() {
            return Err(Error::missing_field("cursor_field"));
        }
        if self.datetime_format.is_empty() {
            return Err(Error::missing_field("datetime_format"));
        }

        Ok(DatetimeCursor {
            config: self.config,
            start_datetime: self.start_datetime,
            end_datetime: self.end_datetime,
            step,
            cursor_granularity,
            cursor_field: self.cursor_field,
            datetime_format: self.datetime_format,
            cursor_datetime_formats: self.cursor_datetime_formats,
            lookback_window: self.lookback_window,
            partition_field_start: self
                .partition_field_start
                .unwrap_or_else(|| DEFAULT_PARTITION_FIELD_START.to_string()),
            partition_field_end_from_user: self.partition_field_end.is_some(),
            partition_field_end: self
                .partition_field_end
                .unwrap_or_else(|| DEFAULT_PARTITION_FIELD_END.to_string()),
            start_time_option: self.start_time_option,
            end_time_option: self.end_time_option,
            clock: self.clock.unwrap_or_else(|| Box::new(SystemClock)),
            state: StreamState::new(),
            cursor: None,
        })
    }
}
