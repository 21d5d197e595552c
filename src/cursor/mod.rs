//! Datetime-based incremental cursor
//!
//! The cursor turns a stream configuration into an ordered sequence of
//! time-bounded slices, folds observed records and closed slices into the
//! next checkpoint state, filters records against the effective sync
//! window, and surfaces slice boundaries as request options.

mod datetime_cursor;
mod types;

pub use datetime_cursor::{DatetimeCursor, DatetimeCursorBuilder};
pub use types::{Clock, FixedClock, RequestOption, RequestOptionType, SystemClock};
