//! YAML loader module
//!
//! Parse incremental sync definitions from YAML files.
//!
//! # Overview
//!
//! The loader module provides:
//! - `IncrementalSyncDefinition` - Declarative incremental sync definition
//! - `DatetimeCursorDefinition` - Datetime cursor configuration
//! - YAML parsing with validation

mod parser;
mod types;

pub use parser::{load_cursor, load_cursor_from_str};
pub use types::{DatetimeCursorDefinition, IncrementalSyncDefinition};
