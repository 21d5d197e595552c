//! Template interpolation for cursor configuration values
//!
//! Handles `{{ ... }}` interpolation in cursor configurations. The variable
//! set is deliberately closed: expressions may reference `config` and
//! `stream_state` (with `['key']` or `.key` access), plus the `today_utc()`
//! helper. A reference to an undefined key resolves to the empty string,
//! which downstream defaults treat as "absent".

use crate::types::{JsonValue, StreamState};
use chrono::NaiveDate;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Regex for matching template expressions: {{ expression }}
static TEMPLATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*(.+?)\s*\}\}").unwrap());

/// Context for template interpolation
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    /// Static connector configuration
    pub config: &'a JsonValue,
    /// Stream state provided to `set_initial_state`
    pub stream_state: &'a StreamState,
    /// Today's date in UTC, from the injected clock
    pub today: NaiveDate,
}

/// Render a template string with the given context.
///
/// Non-template strings are returned verbatim; undefined references become
/// the empty string.
pub fn resolve(template: &str, ctx: &TemplateContext) -> String {
    TEMPLATE_REGEX
        .replace_all(template, |caps: &Captures| {
            eval_expr(&caps[1], ctx).unwrap_or_else(|| {
                tracing::debug!(expression = &caps[1], "template expression is undefined");
                String::new()
            })
        })
        .into_owned()
}

/// Evaluate a single expression against the context
fn eval_expr(expr: &str, ctx: &TemplateContext) -> Option<String> {
    if expr == "today_utc()" {
        return Some(ctx.today.format("%Y-%m-%d").to_string());
    }

    let root_end = expr.find(['.', '[']).unwrap_or(expr.len());
    let (root, rest) = expr.split_at(root_end);
    let keys = parse_keys(rest)?;
    if keys.is_empty() {
        return None;
    }

    match root {
        "config" => {
            let mut current = ctx.config;
            for key in &keys {
                current = current.get(key)?;
            }
            value_to_string(current)
        }
        "stream_state" => {
            // Stream state is a flat map; nested access never resolves
            if keys.len() == 1 {
                ctx.stream_state.get(&keys[0]).cloned()
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Parse an access chain like `['start_date']` or `.credentials.key`
fn parse_keys(mut rest: &str) -> Option<Vec<String>> {
    let mut keys = Vec::new();
    while !rest.is_empty() {
        if let Some(r) = rest.strip_prefix('.') {
            let end = r.find(['.', '[']).unwrap_or(r.len());
            if end == 0 {
                return None;
            }
            keys.push(r[..end].to_string());
            rest = &r[end..];
        } else if let Some(r) = rest.strip_prefix('[') {
            let close = r.find(']')?;
            let key = r[..close].trim().trim_matches(['\'', '"']);
            if key.is_empty() {
                return None;
            }
            keys.push(key.to_string());
            rest = &r[close + 1..];
        } else {
            return None;
        }
    }
    Some(keys)
}

/// Convert a JSON value to a string for template substitution
fn value_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx<'a>(config: &'a JsonValue, state: &'a StreamState) -> TemplateContext<'a> {
        TemplateContext {
            config,
            stream_state: state,
            today: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_bracket_access() {
        let config = json!({"start_date": "2021-01-01T00:00:00.000000+0000"});
        let state = StreamState::new();
        assert_eq!(
            resolve("{{ config['start_date'] }}", &ctx(&config, &state)),
            "2021-01-01T00:00:00.000000+0000"
        );
    }

    #[test]
    fn test_dot_access() {
        let config = json!({"start_date": "2021-01-01"});
        let state = StreamState::new();
        assert_eq!(resolve("{{ config.start_date }}", &ctx(&config, &state)), "2021-01-01");
    }

    #[test]
    fn test_nested_config_access() {
        let config = json!({"credentials": {"start": "2021-06-01"}});
        let state = StreamState::new();
        let c = ctx(&config, &state);
        assert_eq!(resolve("{{ config['credentials']['start'] }}", &c), "2021-06-01");
        assert_eq!(resolve("{{ config.credentials.start }}", &c), "2021-06-01");
    }

    #[test]
    fn test_stream_state_access() {
        let config = json!({});
        let mut state = StreamState::new();
        state.insert("created".to_string(), "2021-01-05".to_string());
        assert_eq!(
            resolve("{{ stream_state['created'] }}", &ctx(&config, &state)),
            "2021-01-05"
        );
    }

    #[test]
    fn test_today_utc_helper() {
        let config = json!({});
        let state = StreamState::new();
        assert_eq!(resolve("{{ today_utc() }}", &ctx(&config, &state)), "2022-01-01");
    }

    #[test]
    fn test_undefined_resolves_to_empty() {
        let config = json!({"present": "x"});
        let state = StreamState::new();
        let c = ctx(&config, &state);
        assert_eq!(resolve("{{ config['does_not_exist'] }}", &c), "");
        assert_eq!(resolve("{{ stream_state['missing'] }}", &c), "");
        assert_eq!(resolve("{{ unknown_root.key }}", &c), "");
    }

    #[test]
    fn test_non_template_verbatim() {
        let config = json!({});
        let state = StreamState::new();
        let c = ctx(&config, &state);
        assert_eq!(resolve("2021-01-01T00:00:00.000000+0000", &c), "2021-01-01T00:00:00.000000+0000");
        assert_eq!(resolve("created", &c), "created");
    }

    #[test]
    fn test_scalar_coercion() {
        let config = json!({"epoch": 1609459200, "flag": true});
        let state = StreamState::new();
        let c = ctx(&config, &state);
        assert_eq!(resolve("{{ config['epoch'] }}", &c), "1609459200");
        assert_eq!(resolve("{{ config['flag'] }}", &c), "true");
    }

    #[test]
    fn test_whitespace_variants() {
        let config = json!({"key": "value"});
        let state = StreamState::new();
        let c = ctx(&config, &state);
        assert_eq!(resolve("{{config['key']}}", &c), "value");
        assert_eq!(resolve("{{  config['key']  }}", &c), "value");
        assert_eq!(resolve("{{ config[ 'key' ] }}", &c), "value");
    }

    #[test]
    fn test_mixed_text_and_template() {
        let config = json!({"a": "1", "b": "2"});
        let state = StreamState::new();
        assert_eq!(
            resolve("from {{ config['a'] }} to {{ config['b'] }}", &ctx(&config, &state)),
            "from 1 to 2"
        );
    }

}
