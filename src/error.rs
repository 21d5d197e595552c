//! Error types for Timeslice CDK
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! The cursor performs no retries internally; every error propagates to the
//! caller, which owns retry policy.

use thiserror::Error;

/// The main error type for Timeslice CDK
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    /// A cursor or definition is misconfigured
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A required configuration field is absent
    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    /// A configuration field is present but unusable
    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    /// YAML deserialization failed
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ============================================================================
    // Datetime Errors
    // ============================================================================
    /// No candidate format could parse a datetime string
    #[error("No datetime format matched '{value}' (tried: {formats})")]
    DatetimeParse { value: String, formats: String },

    /// A datetime could not be rendered with the given pattern
    #[error("Cannot format datetime with pattern '{pattern}': {message}")]
    DatetimeFormat { pattern: String, message: String },

    /// An ISO 8601 duration string is malformed
    #[error("Invalid duration '{value}': {message}")]
    Duration { value: String, message: String },

    // ============================================================================
    // Template Errors
    // ============================================================================
    /// A template expression could not be evaluated
    #[error("Template error: {message}")]
    Template { message: String },

    // ============================================================================
    // State Errors
    // ============================================================================
    /// Stream state is inconsistent with the cursor configuration
    #[error("State error: {message}")]
    State { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    /// Underlying I/O failure, typically while reading a definition file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    /// A contextualized error from [`ResultExt`]
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a datetime parse error from the value and the candidate formats
    pub fn datetime_parse(value: impl Into<String>, formats: &[impl AsRef<str>]) -> Self {
        Self::DatetimeParse {
            value: value.into(),
            formats: formats
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Create a datetime format error
    pub fn datetime_format(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DatetimeFormat {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create a duration error
    pub fn duration(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Duration {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create a template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Check if this error is a configuration problem (fatal at construction)
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::MissingConfigField { .. }
                | Error::InvalidConfigValue { .. }
                | Error::Duration { .. }
                | Error::YamlParse(_)
        )
    }
}

/// Result type alias for Timeslice CDK
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("start_datetime");
        assert_eq!(
            err.to_string(),
            "Missing required config field: start_datetime"
        );

        let err = Error::duration("P1X", "unknown unit");
        assert_eq!(err.to_string(), "Invalid duration 'P1X': unknown unit");
    }

    #[test]
    fn test_datetime_parse_lists_formats() {
        let err = Error::datetime_parse("not-a-date", &["%Y-%m-%d", "%s"]);
        let msg = err.to_string();
        assert!(msg.contains("not-a-date"));
        assert!(msg.contains("%Y-%m-%d, %s"));
    }

    #[test]
    fn test_is_config() {
        assert!(Error::config("test").is_config());
        assert!(Error::duration("x", "y").is_config());
        assert!(!Error::datetime_parse("x", &["%s"]).is_config());
        assert!(!Error::state("test").is_config());
    }

    #[test]
    fn test_yaml_error_converts_and_is_config() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("key: [unclosed").unwrap_err();
        let err: Error = yaml_err.into();
        assert!(matches!(err, Error::YamlParse(_)));
        assert!(err.is_config());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
