// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # Timeslice CDK
//!
//! A Rust-native datetime-based incremental cursor for declarative data
//! source connectors.
//!
//! ## Features
//!
//! - **Time Slicing**: Split a sync window into bounded, contiguous slices
//! - **Checkpointing**: Fold closed slices and observed records into state
//! - **Record Filtering**: Drop records outside the effective sync window
//! - **Request Options**: Surface slice bounds as params, headers, or body keys
//! - **Templates**: `{{ config[...] }}` and `{{ stream_state[...] }}` interpolation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use timeslice_cdk::{load_cursor, Result};
//!
//! fn main() -> Result<()> {
//!     // Load cursor definition from YAML
//!     let definition = load_cursor("incremental.yaml")?;
//!
//!     // Build against the connector configuration
//!     let config = serde_json::json!({ "start_date": "2021-01-01" });
//!     let mut cursor = definition.build(config)?;
//!
//!     for slice in cursor.stream_slices()? {
//!         let params = cursor.get_request_params(&slice);
//!         // ... fetch records, then checkpoint
//!         cursor.close_slice(&slice, None)?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       DatetimeCursor                            │
//! │  stream_slices() → Vec<StreamSlice>    close_slice() → state    │
//! │  should_be_synced(record) → bool    get_request_*() → options   │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴──────────────┬──────────────────┐
//! │   datetime   │           template           │      loader      │
//! ├──────────────┼──────────────────────────────┼──────────────────┤
//! │ Multi-format │ config / stream_state access │ YAML definitions │
//! │ ISO duration │ today_utc() helper           │ Validation       │
//! └──────────────┴──────────────────────────────┴──────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the CDK
pub mod error;

/// Common types and type aliases
pub mod types;

/// Datetime parsing, formatting, and ISO 8601 durations
pub mod datetime;

/// Template interpolation
pub mod template;

/// Datetime-based incremental cursor
pub mod cursor;

/// YAML loader for cursor definitions
pub mod loader;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use cursor::{
    Clock, DatetimeCursor, DatetimeCursorBuilder, FixedClock, RequestOption, RequestOptionType,
    SystemClock,
};
pub use loader::{load_cursor, load_cursor_from_str, IncrementalSyncDefinition};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
