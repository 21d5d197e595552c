//! YAML parser for incremental sync definitions
//!
//! Parses and validates incremental sync YAML files.

use crate::error::{Error, Result, ResultExt};
use crate::loader::types::{DatetimeCursorDefinition, IncrementalSyncDefinition};
use std::fs;
use std::path::Path;

/// Load an incremental sync definition from a YAML file
///
/// # Examples
///
/// ```ignore
/// let definition = load_cursor("./incremental.yaml")?;
/// let cursor = definition.build(config)?;
/// ```
pub fn load_cursor(path: impl AsRef<Path>) -> Result<IncrementalSyncDefinition> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read cursor definition '{}'", path.display()))?;
    load_cursor_from_str(&content)
}

/// Load an incremental sync definition from a YAML string
pub fn load_cursor_from_str(yaml: &str) -> Result<IncrementalSyncDefinition> {
    let def: IncrementalSyncDefinition = serde_yaml::from_str(yaml)?;

    match &def {
        IncrementalSyncDefinition::Datetime(cursor) => validate_datetime_cursor(cursor)?,
    }
    Ok(def)
}

/// Validate a datetime cursor definition
fn validate_datetime_cursor(def: &DatetimeCursorDefinition) -> Result<()> {
    if def.start_datetime.is_empty() {
        return Err(Error::config("start_datetime cannot be empty"));
    }

    if def.cursor_field.is_empty() {
        return Err(Error::config("cursor_field cannot be empty"));
    }

    if def.datetime_format.is_empty() {
        return Err(Error::config("datetime_format cannot be empty"));
    }

    // step and cursor_granularity come as a pair
    match (&def.step, &def.cursor_granularity) {
        (Some(_), None) => {
            return Err(Error::config(
                "step requires cursor_granularity to be set as well",
            ));
        }
        (None, Some(_)) => {
            return Err(Error::config(
                "cursor_granularity requires step to be set as well",
            ));
        }
        _ => {}
    }

    Ok(())
}
