//! Integration tests for the datetime cursor
//!
//! Tests the full end-to-end flow: YAML definition → slices → sync loop →
//! checkpointed state.

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use timeslice_cdk::loader::load_cursor_from_str;
use timeslice_cdk::types::{StreamSlice, StreamState};
use timeslice_cdk::{DatetimeCursor, FixedClock, RequestOption, RequestOptionType};

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.%f%z";

/// Route cursor tracing through the test harness, honoring `RUST_LOG`
fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn fixed_clock() -> Box<FixedClock> {
    Box::new(FixedClock(Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap()))
}

fn slice(start: &str, end: &str) -> StreamSlice {
    StreamSlice::from([
        ("start_time".to_string(), start.to_string()),
        ("end_time".to_string(), end.to_string()),
    ])
}

// ============================================================================
// YAML End-to-End Tests
// ============================================================================

#[test]
fn test_yaml_definition_drives_a_full_sync() {
    init_tracing();
    let yaml = r#"
type: datetime
start_datetime: "{{ config['start_date'] }}"
end_datetime: "2021-01-05T00:00:00.000000+0000"
cursor_field: created
datetime_format: "%Y-%m-%dT%H:%M:%S.%f%z"
step: P1D
cursor_granularity: PT0.000001S
start_time_option:
  inject_into: request_parameter
  field_name: created[gte]
end_time_option:
  inject_into: request_parameter
  field_name: created[lte]
"#;
    let definition = load_cursor_from_str(yaml).unwrap();
    let timeslice_cdk::IncrementalSyncDefinition::Datetime(def) = &definition;

    let config = json!({"start_date": "2021-01-01T00:00:00.000000+0000"});
    let mut cursor = def.build_with_clock(config, fixed_clock()).unwrap();

    let slices = cursor.stream_slices().unwrap();
    assert_eq!(
        slices,
        vec![
            slice("2021-01-01T00:00:00.000000+0000", "2021-01-01T23:59:59.999999+0000"),
            slice("2021-01-02T00:00:00.000000+0000", "2021-01-02T23:59:59.999999+0000"),
            slice("2021-01-03T00:00:00.000000+0000", "2021-01-03T23:59:59.999999+0000"),
            slice("2021-01-04T00:00:00.000000+0000", "2021-01-04T23:59:59.999999+0000"),
            slice("2021-01-05T00:00:00.000000+0000", "2021-01-05T00:00:00.000000+0000"),
        ]
    );

    // Simulate a sync: each slice yields one record at its start instant
    for s in &slices {
        let params = cursor.get_request_params(s);
        assert_eq!(params["created[gte]"], s["start_time"]);
        assert_eq!(params["created[lte]"], s["end_time"]);

        let record = json!({"id": 1, "created": s["start_time"]});
        assert!(cursor.should_be_synced(&record).unwrap());
        cursor.close_slice(s, Some(&record)).unwrap();
    }

    assert_eq!(
        cursor.get_stream_state(),
        StreamState::from([(
            "created".to_string(),
            "2021-01-05T00:00:00.000000+0000".to_string()
        )])
    );
}

#[test]
fn test_resumed_sync_starts_from_checkpoint() {
    init_tracing();
    let yaml = r#"
type: datetime
start_datetime: "2021-01-01T00:00:00.000000+0000"
end_datetime: "2021-01-10T00:00:00.000000+0000"
cursor_field: created
datetime_format: "%Y-%m-%dT%H:%M:%S.%f%z"
step: P1D
cursor_granularity: PT0.000001S
"#;
    let definition = load_cursor_from_str(yaml).unwrap();
    let timeslice_cdk::IncrementalSyncDefinition::Datetime(def) = &definition;

    // First run: sync half the window, then checkpoint
    let mut first = def.build_with_clock(json!({}), fixed_clock()).unwrap();
    let slices = first.stream_slices().unwrap();
    assert_eq!(slices.len(), 10);
    for s in &slices[..5] {
        first.close_slice(s, None).unwrap();
    }
    let checkpoint = first.get_stream_state();
    assert_eq!(
        checkpoint,
        StreamState::from([(
            "created".to_string(),
            "2021-01-05T23:59:59.999999+0000".to_string()
        )])
    );

    // Second run resumes from the checkpoint rather than the configured start
    let mut second = def.build_with_clock(json!({}), fixed_clock()).unwrap();
    second.set_initial_state(checkpoint);
    let resumed = second.stream_slices().unwrap();
    assert_eq!(resumed.len(), 5);
    assert_eq!(
        resumed[0],
        slice("2021-01-05T23:59:59.999999+0000", "2021-01-06T23:59:59.999998+0000")
    );
    assert_eq!(
        resumed[4],
        slice("2021-01-09T23:59:59.999999+0000", "2021-01-10T00:00:00.000000+0000")
    );
}

#[test]
fn test_state_template_in_start_datetime() {
    init_tracing();
    let yaml = r#"
type: datetime
start_datetime: "{{ stream_state['created'] }}"
end_datetime: "2021-01-10T00:00:00.000000+0000"
cursor_field: created
datetime_format: "%Y-%m-%dT%H:%M:%S.%f%z"
step: P1D
cursor_granularity: PT0.000001S
"#;
    let definition = load_cursor_from_str(yaml).unwrap();
    let timeslice_cdk::IncrementalSyncDefinition::Datetime(def) = &definition;

    let mut cursor = def.build_with_clock(json!({}), fixed_clock()).unwrap();
    cursor.set_initial_state(StreamState::from([(
        "created".to_string(),
        "2021-01-08T00:00:00.000000+0000".to_string(),
    )]));

    let slices = cursor.stream_slices().unwrap();
    assert_eq!(slices.len(), 3);
    assert_eq!(slices[0]["start_time"], "2021-01-08T00:00:00.000000+0000");
}

// ============================================================================
// Programmatic Builder Tests
// ============================================================================

#[test]
fn test_builder_sync_with_late_arriving_records() {
    init_tracing();
    let mut cursor = DatetimeCursor::builder(
        "2021-01-01T00:00:00.000000+0000",
        "created",
        DATETIME_FORMAT,
    )
    .end_datetime("2021-01-03T00:00:00.000000+0000")
    .step("P1D")
    .cursor_granularity("PT0.000001S")
    .clock(fixed_clock())
    .build()
    .unwrap();

    let slices = cursor.stream_slices().unwrap();
    assert_eq!(slices.len(), 3);

    // Record timestamps land inside their slices; state tracks the max seen
    let r1 = json!({"created": "2021-01-01T12:00:00.000000+0000"});
    cursor.close_slice(&slices[0], Some(&r1)).unwrap();
    let r2 = json!({"created": "2021-01-02T08:00:00.000000+0000"});
    cursor.close_slice(&slices[1], Some(&r2)).unwrap();

    // Empty final slice: no record observed, so its end closes the window
    cursor.close_slice(&slices[2], None).unwrap();

    assert_eq!(
        cursor.get_stream_state(),
        StreamState::from([(
            "created".to_string(),
            "2021-01-03T00:00:00.000000+0000".to_string()
        )])
    );
}

#[test]
fn test_filtering_against_mixed_record_formats() {
    init_tracing();
    let cursor = DatetimeCursor::builder(
        "2021-01-01T00:00:00.000000+0000",
        "created",
        DATETIME_FORMAT,
    )
    .end_datetime("2021-01-10T00:00:00.000000+0000")
    .cursor_datetime_formats(vec!["%Y-%m-%d".to_string(), "%s".to_string()])
    .clock(fixed_clock())
    .build()
    .unwrap();

    let iso = json!({"created": "2021-01-05T00:00:00.000000+0000"});
    let date_only = json!({"created": "2021-01-05"});
    let epoch = json!({"created": "1609804800"});
    assert!(cursor.should_be_synced(&iso).unwrap());
    assert!(cursor.should_be_synced(&date_only).unwrap());
    assert!(cursor.should_be_synced(&epoch).unwrap());

    let stale = json!({"created": "2020-06-01"});
    assert!(!cursor.should_be_synced(&stale).unwrap());
}

#[test]
fn test_body_injection_points() {
    init_tracing();
    let cursor = DatetimeCursor::builder(
        "2021-01-01T00:00:00.000000+0000",
        "created",
        DATETIME_FORMAT,
    )
    .end_datetime("2021-01-10T00:00:00.000000+0000")
    .start_time_option(RequestOption::new(RequestOptionType::BodyJson, "after"))
    .end_time_option(RequestOption::new(RequestOptionType::BodyData, "before"))
    .clock(fixed_clock())
    .build()
    .unwrap();

    let s = slice(
        "2021-01-01T00:00:00.000000+0000",
        "2021-01-04T00:00:00.000000+0000",
    );
    assert_eq!(
        cursor.get_request_body_json(&s).get("after"),
        Some(&json!("2021-01-01T00:00:00.000000+0000"))
    );
    assert_eq!(
        cursor.get_request_body_data(&s)["before"],
        "2021-01-04T00:00:00.000000+0000"
    );
    assert!(cursor.get_request_params(&s).is_empty());
    assert!(cursor.get_request_headers(&s).is_empty());
}
