// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use seguro_core::Weekday;

/// 2024-05-06 is a Monday.
fn monday_noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap()
}

fn seconds_spec(interval: u64) -> ScheduleSpec {
    ScheduleSpec { interval, ..default_spec() }
}

fn default_spec() -> ScheduleSpec {
    serde_yaml::from_str("{}").unwrap()
}

#[test]
fn entry_fires_after_interval() {
    let mut wheel = TimerWheel::with_seed(1);
    let now = monday_noon();
    wheel.register("job", "s", &seconds_spec(10), now).unwrap();

    assert!(wheel.fired(now + chrono::Duration::seconds(5)).is_empty());

    let fired = wheel.fired(now + chrono::Duration::seconds(10));
    assert_eq!(
        fired,
        vec![TimerFired { tag: "job".to_string(), trigger_id: "s".to_string() }]
    );
}

#[test]
fn repeating_entry_reschedules() {
    let mut wheel = TimerWheel::with_seed(1);
    let now = monday_noon();
    wheel.register("job", "s", &seconds_spec(2), now).unwrap();

    for tick in 1..=3 {
        let at = now + chrono::Duration::seconds(2 * tick);
        assert_eq!(wheel.fired(at).len(), 1, "tick {tick}");
    }
    assert_eq!(wheel.len(), 1);
}

#[test]
fn once_entry_is_removed_after_firing() {
    let mut wheel = TimerWheel::with_seed(1);
    let now = monday_noon();
    let spec = ScheduleSpec { interval: 1, once: true, ..default_spec() };
    wheel.register("job", "s", &spec, now).unwrap();

    let fired = wheel.fired(now + chrono::Duration::seconds(1));
    assert_eq!(fired.len(), 1);
    assert!(wheel.is_empty());
}

#[test]
fn clear_removes_all_entries_for_tag() {
    let mut wheel = TimerWheel::with_seed(1);
    let now = monday_noon();
    wheel.register("a", "s1", &seconds_spec(1), now).unwrap();
    wheel.register("a", "s2", &seconds_spec(1), now).unwrap();
    wheel.register("b", "s3", &seconds_spec(1), now).unwrap();

    wheel.clear("a");
    assert_eq!(wheel.len(), 1);

    let fired = wheel.fired(now + chrono::Duration::seconds(1));
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].tag, "b");
}

#[test]
fn interval_to_gaps_stay_in_bounds() {
    let mut wheel = TimerWheel::with_seed(42);
    let mut now = monday_noon();
    let spec = ScheduleSpec { interval: 2, interval_to: Some(4), ..default_spec() };
    wheel.register("job", "s", &spec, now).unwrap();

    // Walk second by second; every inter-firing gap must be in [2, 4].
    let mut last_fire = now;
    let mut fires = 0;
    for _ in 0..60 {
        now += chrono::Duration::seconds(1);
        if !wheel.fired(now).is_empty() {
            let gap = (now - last_fire).num_seconds();
            assert!((2..=4).contains(&gap), "gap {gap} out of bounds");
            last_fire = now;
            fires += 1;
        }
    }
    assert!((12..=30).contains(&fires), "{fires} fires over 60s");
}

#[test]
fn until_deadline_drops_entry_without_firing() {
    let mut wheel = TimerWheel::with_seed(1);
    let now = monday_noon();
    let spec = ScheduleSpec {
        interval: 10,
        until: Some(Until::Duration(std::time::Duration::from_secs(5))),
        ..default_spec()
    };
    wheel.register("job", "s", &spec, now).unwrap();

    let fired = wheel.fired(now + chrono::Duration::seconds(10));
    assert!(fired.is_empty());
    assert!(wheel.is_empty());
}

#[test]
fn until_datetime_allows_firings_before_deadline() {
    let mut wheel = TimerWheel::with_seed(1);
    let now = monday_noon();
    let deadline = (now + chrono::Duration::seconds(30)).naive_utc();
    let spec = ScheduleSpec {
        interval: 10,
        until: Some(Until::DateTime(deadline)),
        ..default_spec()
    };
    wheel.register("job", "s", &spec, now).unwrap();

    assert_eq!(wheel.fired(now + chrono::Duration::seconds(10)).len(), 1);
}

#[test]
fn daily_at_pins_time_of_day() {
    let mut wheel = TimerWheel::with_seed(1);
    let now = monday_noon();
    let spec = ScheduleSpec {
        interval: 1,
        unit: ScheduleUnit::Days,
        at: Some("15:30".to_string()),
        ..default_spec()
    };
    wheel.register("job", "s", &spec, now).unwrap();

    // Still today: 15:30 is after 12:00.
    let expected = Utc.with_ymd_and_hms(2024, 5, 6, 15, 30, 0).unwrap();
    assert_eq!(wheel.next_deadline(), Some(expected));
}

#[test]
fn daily_at_in_the_past_rolls_to_tomorrow() {
    let mut wheel = TimerWheel::with_seed(1);
    let now = monday_noon();
    let spec = ScheduleSpec {
        interval: 1,
        unit: ScheduleUnit::Days,
        at: Some("09:00".to_string()),
        ..default_spec()
    };
    wheel.register("job", "s", &spec, now).unwrap();

    let expected = Utc.with_ymd_and_hms(2024, 5, 7, 9, 0, 0).unwrap();
    assert_eq!(wheel.next_deadline(), Some(expected));
}

#[test]
fn hourly_at_pins_minute() {
    let mut wheel = TimerWheel::with_seed(1);
    let now = monday_noon();
    let spec = ScheduleSpec {
        interval: 1,
        unit: ScheduleUnit::Hours,
        at: Some(":45".to_string()),
        ..default_spec()
    };
    wheel.register("job", "s", &spec, now).unwrap();

    let expected = Utc.with_ymd_and_hms(2024, 5, 6, 12, 45, 0).unwrap();
    assert_eq!(wheel.next_deadline(), Some(expected));
}

#[test]
fn weekly_start_day_pins_weekday() {
    let mut wheel = TimerWheel::with_seed(1);
    let now = monday_noon();
    let spec = ScheduleSpec {
        interval: 1,
        unit: ScheduleUnit::Weeks,
        start_day: Weekday::Friday,
        at: Some("08:00".to_string()),
        ..default_spec()
    };
    wheel.register("job", "s", &spec, now).unwrap();

    let next = wheel.next_deadline().unwrap();
    assert_eq!(next.weekday(), chrono::Weekday::Fri);
    assert_eq!(next.time(), NaiveTime::from_hms_opt(8, 0, 0).unwrap());
    assert!(next > now);
}

#[test]
fn invalid_at_fails_registration() {
    let mut wheel = TimerWheel::with_seed(1);
    let spec = ScheduleSpec { at: Some("25:99".to_string()), unit: ScheduleUnit::Days, ..default_spec() };
    assert!(wheel.register("job", "s", &spec, monday_noon()).is_err());
}
