//! Datetime parsing, formatting and calendar-aware durations
//!
//! Cursor values arrive as strings in vendor-specific formats; everything in
//! here converts between those strings and timezone-aware UTC instants.

mod codec;
mod duration;

pub use codec::{format_datetime, parse_any, try_parse, DEFAULT_FORMATS};
pub use duration::IsoDuration;
