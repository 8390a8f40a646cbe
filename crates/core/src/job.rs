// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job specifications, triggers, and invocation context.
//!
//! A `JobSpec` is parsed from a catalog YAML object. Each trigger is a
//! tagged variant; dispatch is by exhaustive match. `JobInfo` is the
//! record handed to a launched container through the `SEGURO_JOB_INFO`
//! environment variable.

use crate::event::{EventKind, EventSet};
use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;
use thiserror::Error;

/// Environment variable carrying the serialized `JobInfo`.
pub const JOB_INFO_ENV: &str = "SEGURO_JOB_INFO";

/// Errors reading the invocation context from the environment.
#[derive(Debug, Error)]
pub enum JobInfoError {
    #[error("missing {JOB_INFO_ENV} environment variable")]
    Missing,
    #[error("malformed job info: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A declarative job description from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Service definition consumed verbatim by the compose backend.
    pub container: serde_json::Value,

    #[serde(default = "default_scale")]
    pub scale: u32,
    #[serde(default)]
    pub recreate: bool,
    #[serde(default)]
    pub build: bool,

    #[serde(default)]
    pub triggers: IndexMap<String, Trigger>,
}

fn default_scale() -> u32 {
    1
}

/// A condition that fires a job launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    Created(StoreSpec),
    Removed(StoreSpec),
    /// Union of created and removed.
    Modified(StoreSpec),
    Schedule(ScheduleSpec),
    Startup,
    Shutdown,
}

impl Trigger {
    /// The trigger type as it appears in catalog documents.
    pub fn kind(&self) -> &'static str {
        match self {
            Trigger::Created(_) => "created",
            Trigger::Removed(_) => "removed",
            Trigger::Modified(_) => "modified",
            Trigger::Schedule(_) => "schedule",
            Trigger::Startup => "startup",
            Trigger::Shutdown => "shutdown",
        }
    }

    /// Store subscription for store-kind triggers: `(prefix, events, initial)`.
    pub fn store_subscription(&self) -> Option<(&str, EventSet, bool)> {
        match self {
            Trigger::Created(spec) => Some((&spec.prefix, EventSet::CREATED, spec.initial)),
            Trigger::Removed(spec) => Some((&spec.prefix, EventSet::REMOVED, spec.initial)),
            Trigger::Modified(spec) => Some((&spec.prefix, EventSet::ALL, spec.initial)),
            _ => None,
        }
    }

    pub fn schedule(&self) -> Option<&ScheduleSpec> {
        match self {
            Trigger::Schedule(spec) => Some(spec),
            _ => None,
        }
    }
}

/// Parameters of a store-event trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSpec {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub initial: bool,
}

fn default_prefix() -> String {
    "/".to_string()
}

/// Parameters of a wall-clock schedule trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSpec {
    #[serde(default = "default_interval")]
    pub interval: u64,
    /// Upper bound for a uniformly random firing interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_to: Option<u64>,
    /// Unregister the entry after its first firing.
    #[serde(default)]
    pub once: bool,
    /// Time-of-day constraint: `HH:MM`, `HH:MM:SS`, or `:MM`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<Until>,
    #[serde(default)]
    pub unit: ScheduleUnit,
    /// Weekly anchor; only meaningful when `unit` is weeks.
    #[serde(default)]
    pub start_day: Weekday,
}

fn default_interval() -> u64 {
    1
}

impl ScheduleSpec {
    /// Parse the `at` constraint into `(hour, minute, second)` where the
    /// hour is absent for the `:MM` form.
    pub fn at_time(&self) -> Result<Option<(Option<u32>, u32, u32)>, ScheduleSpecError> {
        let Some(at) = self.at.as_deref() else {
            return Ok(None);
        };
        let invalid = || ScheduleSpecError::InvalidAt(at.to_string());

        if let Some(minute) = at.strip_prefix(':') {
            let minute: u32 = minute.parse().map_err(|_| invalid())?;
            if minute > 59 {
                return Err(invalid());
            }
            return Ok(Some((None, minute, 0)));
        }

        let mut parts = at.split(':');
        let hour: u32 = parts.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
        let minute: u32 = parts.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
        let second: u32 = match parts.next() {
            Some(s) => s.parse().map_err(|_| invalid())?,
            None => 0,
        };
        if parts.next().is_some() || hour > 23 || minute > 59 || second > 59 {
            return Err(invalid());
        }
        Ok(Some((Some(hour), minute, second)))
    }
}

#[derive(Debug, Error)]
pub enum ScheduleSpecError {
    #[error("invalid at-time pattern: {0}")]
    InvalidAt(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleUnit {
    #[default]
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl ScheduleUnit {
    /// Length of one unit in seconds.
    pub fn seconds(&self) -> u64 {
        match self {
            ScheduleUnit::Seconds => 1,
            ScheduleUnit::Minutes => 60,
            ScheduleUnit::Hours => 3_600,
            ScheduleUnit::Days => 86_400,
            ScheduleUnit::Weeks => 604_800,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    #[default]
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn to_chrono(self) -> chrono::Weekday {
        match self {
            Weekday::Monday => chrono::Weekday::Mon,
            Weekday::Tuesday => chrono::Weekday::Tue,
            Weekday::Wednesday => chrono::Weekday::Wed,
            Weekday::Thursday => chrono::Weekday::Thu,
            Weekday::Friday => chrono::Weekday::Fri,
            Weekday::Saturday => chrono::Weekday::Sat,
            Weekday::Sunday => chrono::Weekday::Sun,
        }
    }
}

/// Drop-dead deadline for a schedule trigger.
///
/// Accepts a datetime, a time-of-day (today at that time), or a
/// duration (now + duration, resolved at registration).
#[derive(Debug, Clone, PartialEq)]
pub enum Until {
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Duration(Duration),
}

impl Until {
    fn parse(s: &str) -> Option<Until> {
        for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(Until::DateTime(dt));
            }
        }
        for fmt in ["%H:%M:%S", "%H:%M"] {
            if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
                return Some(Until::Time(t));
            }
        }
        parse_duration(s).ok().map(Until::Duration)
    }
}

impl Serialize for Until {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let s = match self {
            Until::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Until::Time(t) => t.format("%H:%M:%S").to_string(),
            Until::Duration(d) => format!("{}s", d.as_secs()),
        };
        serializer.serialize_str(&s)
    }
}

impl<'de> Deserialize<'de> for Until {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Until::parse(&s)
            .ok_or_else(|| D::Error::custom(format!("invalid until value: {s:?}")))
    }
}

/// Parse a duration string like "30s", "5m", "1h" into a Duration
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the numeric prefix
    let (num_str, suffix) = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| (&s[..i], &s[i..]))
        .unwrap_or((s, ""));

    let num: u64 = num_str.parse().map_err(|_| format!("invalid number in duration: {}", s))?;

    let multiplier = match suffix.trim() {
        "ms" | "millis" | "millisecond" | "milliseconds" => {
            return Ok(Duration::from_millis(num));
        }
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
        "d" | "day" | "days" => 86400,
        other => return Err(format!("unknown duration suffix: {}", other)),
    };

    Ok(Duration::from_secs(num * multiplier))
}

/// Descriptor of the trigger firing that caused a launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<EventKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
}

/// Invocation context passed to a launched container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInfo {
    pub name: String,
    pub spec: JobSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<TriggerInfo>,
}

impl JobInfo {
    /// Serialize for the `SEGURO_JOB_INFO` environment variable.
    pub fn to_env_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Read the invocation context from the process environment.
    ///
    /// Workload entry points call this once at startup and pass the
    /// value down; there is no ambient global.
    pub fn from_env() -> Result<JobInfo, JobInfoError> {
        let raw = std::env::var(JOB_INFO_ENV).map_err(|_| JobInfoError::Missing)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// The trigger declaration that produced this launch, if any.
    pub fn trigger_spec(&self) -> Option<&Trigger> {
        let info = self.trigger.as_ref()?;
        self.spec.triggers.get(&info.id)
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
