// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule-trigger scenarios: jittered intervals over a time window.

use chrono::{Duration, TimeZone, Utc};
use seguro_core::ScheduleSpec;
use seguro_scheduler::TimerWheel;

#[test]
fn jittered_interval_launch_counts_over_a_minute() {
    // interval 2..4 seconds: over 60 seconds the firing count is
    // between 12 and 30 and every gap is within [2, 4] seconds.
    let spec: ScheduleSpec =
        serde_yaml::from_str("interval: 2\ninterval_to: 4\nunit: seconds\n").unwrap();

    for seed in [7_u64, 11, 1234] {
        let mut wheel = TimerWheel::with_seed(seed);
        let start = Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap();
        wheel.register("job", "s", &spec, start).unwrap();

        let mut now = start;
        let mut last_fire = start;
        let mut launches = 0;
        for _ in 0..60 {
            now += Duration::seconds(1);
            for firing in wheel.fired(now) {
                assert_eq!(firing.tag, "job");
                let gap = (now - last_fire).num_seconds();
                assert!((2..=4).contains(&gap), "seed {seed}: gap {gap}");
                last_fire = now;
                launches += 1;
            }
        }

        assert!((12..=30).contains(&launches), "seed {seed}: {launches} launches");
    }
}

#[test]
fn fixed_interval_is_exact() {
    let spec: ScheduleSpec = serde_yaml::from_str("interval: 10\n").unwrap();

    let mut wheel = TimerWheel::with_seed(1);
    let start = Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap();
    wheel.register("job", "s", &spec, start).unwrap();

    let mut fired_at = Vec::new();
    let mut now = start;
    for _ in 0..35 {
        now += Duration::seconds(1);
        if !wheel.fired(now).is_empty() {
            fired_at.push((now - start).num_seconds());
        }
    }
    assert_eq!(fired_at, vec![10, 20, 30]);
}
