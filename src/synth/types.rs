//! Records produced by the synthesis engine.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, TimeDelta};
use chrono_tz::Tz;

use crate::locations::GeoLocation;
use crate::timetable::Stop;

/// Unordered pair of locations; one calendar feed per key.
///
/// The two names are stored in lexicographic order so `(A, B)` and `(B, A)`
/// build the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    first: String,
    second: String,
}

impl PairKey {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}

/// A departure at a place and time. Events sharing a key are one event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKey {
    pub location: String,
    pub time: DateTime<Tz>,
}

impl EventKey {
    pub fn of(stop: &Stop) -> Self {
        Self {
            location: stop.location(),
            time: stop.time(),
        }
    }
}

/// Weekly recurrence on a fixed set of weekdays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    Weekdays,
}

impl Recurrence {
    /// RFC 5545 `RRULE` value.
    pub fn rrule(&self) -> &'static str {
        match self {
            Recurrence::Weekdays => "FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR",
        }
    }
}

/// One recurring departure, ready to be placed in any number of feeds.
#[derive(Debug, Clone, PartialEq)]
pub struct ShuttleEvent {
    pub key: EventKey,
    pub start: DateTime<Tz>,
    pub duration: TimeDelta,
    pub summary: String,
    pub description: String,
    pub recurrence: Recurrence,
    pub location: String,
    pub structured_location: Option<GeoLocation>,
    /// Shown as free time rather than busy.
    pub transparent: bool,
}

/// Events for one location pair, in insertion order, without duplicates.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    seen: HashSet<EventKey>,
    events: Vec<ShuttleEvent>,
}

impl Feed {
    /// Adds `event` unless an event with the same key is already present.
    pub fn insert(&mut self, event: &ShuttleEvent) -> bool {
        if !self.seen.insert(event.key.clone()) {
            return false;
        }
        self.events.push(event.clone());
        true
    }

    pub fn contains(&self, key: &EventKey) -> bool {
        self.seen.contains(key)
    }

    pub fn events(&self) -> &[ShuttleEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// All feeds of a job, ordered by pair key.
#[derive(Debug, Clone, Default)]
pub struct FeedSet {
    feeds: BTreeMap<PairKey, Feed>,
}

impl FeedSet {
    /// Returns the feed for `key`, creating an empty one first if needed.
    pub fn feed_mut(&mut self, key: PairKey) -> &mut Feed {
        self.feeds.entry(key).or_default()
    }

    pub fn get(&self, key: &PairKey) -> Option<&Feed> {
        self.feeds.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PairKey, &Feed)> {
        self.feeds.iter()
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }

    /// Number of events across all feeds.
    pub fn event_count(&self) -> usize {
        self.feeds.values().map(Feed::len).sum()
    }
}
