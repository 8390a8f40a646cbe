// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn parse_spec(yaml: &str) -> JobSpec {
    serde_yaml::from_str(yaml).unwrap()
}

#[test]
fn minimal_spec_defaults() {
    let spec = parse_spec("container:\n  image: busybox\n");
    assert_eq!(spec.scale, 1);
    assert!(!spec.recreate);
    assert!(!spec.build);
    assert!(spec.triggers.is_empty());
    assert_eq!(spec.container["image"], "busybox");
}

#[test]
fn store_trigger_defaults() {
    let spec = parse_spec(
        "container:\n  image: busybox\ntriggers:\n  t:\n    type: created\n",
    );
    let trigger = &spec.triggers["t"];
    assert_eq!(trigger.kind(), "created");
    let (prefix, events, initial) = trigger.store_subscription().unwrap();
    assert_eq!(prefix, "/");
    assert_eq!(events, EventSet::CREATED);
    assert!(!initial);
}

#[test]
fn modified_maps_to_both_events() {
    let spec = parse_spec(
        "container:\n  image: busybox\ntriggers:\n  t:\n    type: modified\n    prefix: data/\n    initial: true\n",
    );
    let (prefix, events, initial) = spec.triggers["t"].store_subscription().unwrap();
    assert_eq!(prefix, "data/");
    assert_eq!(events, EventSet::ALL);
    assert!(initial);
}

#[test]
fn schedule_trigger_defaults() {
    let spec = parse_spec(
        "container:\n  image: busybox\ntriggers:\n  s:\n    type: schedule\n",
    );
    let schedule = spec.triggers["s"].schedule().unwrap();
    assert_eq!(schedule.interval, 1);
    assert_eq!(schedule.interval_to, None);
    assert!(!schedule.once);
    assert_eq!(schedule.unit, ScheduleUnit::Seconds);
    assert_eq!(schedule.start_day, Weekday::Monday);
}

#[test]
fn schedule_trigger_full() {
    let spec = parse_spec(concat!(
        "container:\n  image: busybox\n",
        "triggers:\n",
        "  s:\n",
        "    type: schedule\n",
        "    interval: 2\n",
        "    interval_to: 4\n",
        "    unit: weeks\n",
        "    start_day: friday\n",
        "    at: \"10:30\"\n",
        "    until: \"2030-01-01 00:00:00\"\n",
    ));
    let schedule = spec.triggers["s"].schedule().unwrap();
    assert_eq!(schedule.interval, 2);
    assert_eq!(schedule.interval_to, Some(4));
    assert_eq!(schedule.unit, ScheduleUnit::Weeks);
    assert_eq!(schedule.start_day, Weekday::Friday);
    assert_eq!(schedule.at_time().unwrap(), Some((Some(10), 30, 0)));
    assert!(matches!(schedule.until, Some(Until::DateTime(_))));
}

#[test]
fn event_triggers_parse() {
    let spec = parse_spec(
        "container:\n  image: busybox\ntriggers:\n  up:\n    type: startup\n  down:\n    type: shutdown\n",
    );
    assert!(matches!(spec.triggers["up"], Trigger::Startup));
    assert!(matches!(spec.triggers["down"], Trigger::Shutdown));
}

#[test]
fn unknown_trigger_type_is_an_error() {
    let err = serde_yaml::from_str::<JobSpec>(
        "container:\n  image: busybox\ntriggers:\n  t:\n    type: bogus\n",
    );
    assert!(err.is_err());
}

#[parameterized(
    full = { "10:30:15", Some((Some(10), 30, 15)) },
    no_seconds = { "10:30", Some((Some(10), 30, 0)) },
    minute_only = { ":45", Some((None, 45, 0)) },
)]
fn at_time_valid(at: &str, expected: Option<(Option<u32>, u32, u32)>) {
    let spec = ScheduleSpec {
        at: Some(at.to_string()),
        ..schedule_default()
    };
    assert_eq!(spec.at_time().unwrap(), expected);
}

#[parameterized(
    hour_out_of_range = { "25:00" },
    minute_out_of_range = { "10:75" },
    garbage = { "noon" },
    too_many_parts = { "10:30:15:00" },
)]
fn at_time_invalid(at: &str) {
    let spec = ScheduleSpec {
        at: Some(at.to_string()),
        ..schedule_default()
    };
    assert!(spec.at_time().is_err());
}

fn schedule_default() -> ScheduleSpec {
    serde_yaml::from_str("{}").unwrap()
}

#[parameterized(
    datetime = { "2030-01-01 12:00:00" },
    datetime_t = { "2030-01-01T12:00:00" },
    time = { "12:30" },
    duration = { "90s" },
    duration_minutes = { "15m" },
)]
fn until_parses(value: &str) {
    let yaml = format!("until: \"{value}\"");
    let spec: ScheduleSpec = serde_yaml::from_str(&yaml).unwrap();
    assert!(spec.until.is_some());
}

#[test]
fn until_rejects_garbage() {
    assert!(serde_yaml::from_str::<ScheduleSpec>("until: \"whenever\"").is_err());
}

#[parameterized(
    bare_seconds = { "30", Duration::from_secs(30) },
    seconds = { "30s", Duration::from_secs(30) },
    minutes = { "5m", Duration::from_secs(300) },
    hours = { "1h", Duration::from_secs(3600) },
    millis = { "250ms", Duration::from_millis(250) },
)]
fn parse_duration_valid(input: &str, expected: Duration) {
    assert_eq!(parse_duration(input).unwrap(), expected);
}

#[parameterized(
    empty = { "" },
    no_number = { "s" },
    bad_suffix = { "10fortnights" },
)]
fn parse_duration_invalid(input: &str) {
    assert!(parse_duration(input).is_err());
}

#[test]
fn job_info_roundtrip() {
    let spec = parse_spec(
        "container:\n  image: busybox\ntriggers:\n  t:\n    type: created\n    prefix: data/raw/\n",
    );
    let info = JobInfo {
        name: "scale".to_string(),
        trigger: Some(TriggerInfo {
            id: "t".to_string(),
            kind: "created".to_string(),
            time: chrono::Utc::now(),
            event: Some(EventKind::Created),
            object: Some("data/raw/42.bin".to_string()),
        }),
        spec,
    };

    let json = info.to_env_json().unwrap();
    let parsed: JobInfo = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, info);
    assert_eq!(parsed.trigger_spec().unwrap().kind(), "created");
}

#[test]
fn job_info_omits_null_fields() {
    let info = JobInfo {
        name: "hello".to_string(),
        spec: parse_spec("container:\n  image: busybox\n"),
        trigger: None,
    };
    let json = info.to_env_json().unwrap();
    assert!(!json.contains("\"trigger\""));
    assert!(!json.contains("null"));
}

#[test]
fn from_env_missing_is_distinct_from_malformed() {
    std::env::remove_var(JOB_INFO_ENV);
    assert!(matches!(JobInfo::from_env(), Err(JobInfoError::Missing)));

    std::env::set_var(JOB_INFO_ENV, "{not json");
    assert!(matches!(JobInfo::from_env(), Err(JobInfoError::Malformed(_))));
    std::env::remove_var(JOB_INFO_ENV);
}
