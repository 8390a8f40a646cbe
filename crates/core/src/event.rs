// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object-store event kinds and event-set flags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// A single object-store change-feed event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Created,
    Removed,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Removed => "removed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of store event kinds a watcher subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSet(u8);

impl EventSet {
    pub const EMPTY: EventSet = EventSet(0);
    pub const CREATED: EventSet = EventSet(1);
    pub const REMOVED: EventSet = EventSet(2);
    pub const ALL: EventSet = EventSet(3);

    pub fn contains(&self, kind: EventKind) -> bool {
        let bit = EventSet::from(kind);
        self.0 & bit.0 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl From<EventKind> for EventSet {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Created => EventSet::CREATED,
            EventKind::Removed => EventSet::REMOVED,
        }
    }
}

impl BitOr for EventSet {
    type Output = EventSet;

    fn bitor(self, rhs: EventSet) -> EventSet {
        EventSet(self.0 | rhs.0)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
