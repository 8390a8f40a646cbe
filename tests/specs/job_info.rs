// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Invocation-context scenarios: what a launched container observes.

use chrono::{TimeZone, Utc};
use seguro_core::{EventKind, JobInfo, JobSpec, JOB_INFO_ENV};
use seguro_scheduler::job::{build_job_info, launch_overlay};
use seguro_scheduler::TriggerContext;

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap()
}

fn container_env(overlay: &serde_json::Value, name: &str) -> JobInfo {
    let raw = overlay["services"][name]["environment"][JOB_INFO_ENV]
        .as_str()
        .unwrap();
    serde_json::from_str(raw).unwrap()
}

#[test]
fn startup_launch_has_null_trigger() {
    // A job with no triggers launches once at startup; its JobInfo
    // carries the name and spec but no trigger descriptor.
    let spec: JobSpec = serde_yaml::from_str(
        "container:\n  image: busybox\n  command: [echo, hi]\n",
    )
    .unwrap();

    let info = build_job_info("hello", &spec, None, now());
    let overlay = launch_overlay("hello", &info).unwrap();
    let observed = container_env(&overlay, "hello");

    assert_eq!(observed.name, "hello");
    assert!(observed.trigger.is_none());
    assert_eq!(observed.spec.container["image"], "busybox");
}

#[test]
fn store_created_launch_carries_event_and_object() {
    let spec: JobSpec = serde_yaml::from_str(concat!(
        "container:\n  image: busybox\n",
        "triggers:\n  t:\n    type: created\n    prefix: data/raw/\n",
    ))
    .unwrap();

    let context = TriggerContext {
        trigger_id: "t".to_string(),
        event: Some(EventKind::Created),
        object: Some("data/raw/42.bin".to_string()),
    };
    let info = build_job_info("scale", &spec, Some(&context), now());
    let observed = container_env(&launch_overlay("scale", &info).unwrap(), "scale");

    let trigger = observed.trigger.unwrap();
    assert_eq!(trigger.id, "t");
    assert_eq!(trigger.kind, "created");
    assert_eq!(trigger.event, Some(EventKind::Created));
    assert_eq!(trigger.object.as_deref(), Some("data/raw/42.bin"));
}

#[test]
fn observed_info_equals_constructed_record() {
    let spec: JobSpec = serde_yaml::from_str(concat!(
        "container:\n  image: busybox\n",
        "scale: 2\n",
        "triggers:\n",
        "  t:\n    type: modified\n    prefix: data/\n    initial: true\n",
        "  s:\n    type: schedule\n    interval: 5\n    unit: minutes\n",
    ))
    .unwrap();

    let context = TriggerContext {
        trigger_id: "t".to_string(),
        event: Some(EventKind::Removed),
        object: Some("data/old.bin".to_string()),
    };
    let info = build_job_info("worker", &spec, Some(&context), now());
    let observed = container_env(&launch_overlay("worker", &info).unwrap(), "worker");

    assert_eq!(observed, info);
}
