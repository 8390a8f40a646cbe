// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer wheel for schedule triggers.
//!
//! Entries are tagged with their job name so that stopping a job clears
//! all of its entries atomically. The wheel is driven by the
//! scheduler's ~1s tick; `fired` drains due entries and reschedules
//! them from the current time.

use chrono::{DateTime, Datelike, NaiveTime, TimeZone, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use seguro_core::{ScheduleSpec, ScheduleSpecError, ScheduleUnit, Until};

/// A due schedule entry returned by [`TimerWheel::fired`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerFired {
    pub tag: String,
    pub trigger_id: String,
}

struct TimerEntry {
    tag: String,
    trigger_id: String,
    spec: ScheduleSpec,
    next_run: DateTime<Utc>,
    deadline: Option<DateTime<Utc>>,
}

pub struct TimerWheel {
    entries: Vec<TimerEntry>,
    rng: StdRng,
}

impl TimerWheel {
    pub fn new() -> TimerWheel {
        TimerWheel { entries: Vec::new(), rng: StdRng::from_entropy() }
    }

    /// Deterministic wheel for tests.
    pub fn with_seed(seed: u64) -> TimerWheel {
        TimerWheel { entries: Vec::new(), rng: StdRng::seed_from_u64(seed) }
    }

    /// Register a schedule entry tagged with a job name.
    pub fn register(
        &mut self,
        tag: &str,
        trigger_id: &str,
        spec: &ScheduleSpec,
        now: DateTime<Utc>,
    ) -> Result<(), ScheduleSpecError> {
        let deadline = spec.until.as_ref().map(|until| resolve_until(until, now));
        let next_run = next_run(spec, now, &mut self.rng)?;
        self.entries.push(TimerEntry {
            tag: tag.to_string(),
            trigger_id: trigger_id.to_string(),
            spec: spec.clone(),
            next_run,
            deadline,
        });
        Ok(())
    }

    /// Remove every entry carrying the given tag.
    pub fn clear(&mut self, tag: &str) {
        self.entries.retain(|entry| entry.tag != tag);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Earliest pending run, if any.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.entries.iter().map(|entry| entry.next_run).min()
    }

    /// Drain all entries due at `now`, rescheduling repeating ones.
    ///
    /// Entries past their `until` deadline are dropped without firing;
    /// `once` entries fire and are removed.
    pub fn fired(&mut self, now: DateTime<Utc>) -> Vec<TimerFired> {
        let mut fired = Vec::new();
        let mut index = 0;
        while index < self.entries.len() {
            if self.entries[index].next_run > now {
                index += 1;
                continue;
            }
            if let Some(deadline) = self.entries[index].deadline {
                if now > deadline {
                    self.entries.remove(index);
                    continue;
                }
            }

            fired.push(TimerFired {
                tag: self.entries[index].tag.clone(),
                trigger_id: self.entries[index].trigger_id.clone(),
            });

            if self.entries[index].spec.once {
                self.entries.remove(index);
                continue;
            }
            match next_run(&self.entries[index].spec, now, &mut self.rng) {
                Ok(next) => {
                    self.entries[index].next_run = next;
                    index += 1;
                }
                Err(e) => {
                    tracing::warn!(tag = %self.entries[index].tag, error = %e, "dropping unschedulable entry");
                    self.entries.remove(index);
                }
            }
        }
        fired
    }
}

impl Default for TimerWheel {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_until(until: &Until, now: DateTime<Utc>) -> DateTime<Utc> {
    match until {
        Until::DateTime(dt) => Utc.from_utc_datetime(dt),
        Until::Time(t) => Utc.from_utc_datetime(&now.date_naive().and_time(*t)),
        Until::Duration(d) => {
            now + chrono::Duration::from_std(*d).unwrap_or_else(|_| chrono::Duration::zero())
        }
    }
}

/// Compute the next firing after `now`.
///
/// The interval is drawn uniformly from `[interval, interval_to]` when
/// an upper bound is set. An `at` constraint pins the relevant
/// time-of-day fields; `start_day` pins the weekday for weekly
/// schedules.
fn next_run(
    spec: &ScheduleSpec,
    now: DateTime<Utc>,
    rng: &mut StdRng,
) -> Result<DateTime<Utc>, ScheduleSpecError> {
    let interval = match spec.interval_to {
        Some(latest) if latest > spec.interval => rng.gen_range(spec.interval..=latest),
        Some(_) | None => spec.interval,
    };
    // A zero interval would never advance past `now`.
    let interval = interval.max(1);
    let period = chrono::Duration::seconds((interval * spec.unit.seconds()) as i64);
    let mut candidate = now + period;

    if spec.unit == ScheduleUnit::Weeks {
        let target = spec.start_day.to_chrono().num_days_from_monday() as i64;
        let current = candidate.weekday().num_days_from_monday() as i64;
        candidate += chrono::Duration::days((target - current).rem_euclid(7));
    }

    if let Some((hour, minute, second)) = spec.at_time()? {
        let time = match spec.unit {
            // Seconds-granularity schedules have no time-of-day anchor.
            ScheduleUnit::Seconds => None,
            ScheduleUnit::Minutes => NaiveTime::from_hms_opt(
                candidate.hour(),
                candidate.minute(),
                second,
            ),
            ScheduleUnit::Hours => NaiveTime::from_hms_opt(candidate.hour(), minute, second),
            ScheduleUnit::Days | ScheduleUnit::Weeks => {
                NaiveTime::from_hms_opt(hour.unwrap_or(0), minute, second)
            }
        };
        if let Some(time) = time {
            candidate = Utc.from_utc_datetime(&candidate.date_naive().and_time(time));
            // Realign to the soonest match strictly after now. The
            // period is a whole multiple of the pinned granularity, so
            // stepping preserves the at-constraint.
            while candidate <= now {
                candidate += period;
            }
            while candidate - period > now {
                candidate -= period;
            }
        }
    }

    Ok(candidate)
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
