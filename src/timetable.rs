//! Stops, runs, and the per-job timetable that owns them.

use chrono::DateTime;
use chrono_tz::Tz;
use tracing::debug;

const DEPARTS_MARKER: &str = "Departs";
const ARRIVES_MARKER: &str = "Arrives";

/// One timestamped appearance of a run at a labeled point.
///
/// Labels in the source timetable read like `"Departs from Grace Auditorium"`;
/// the place itself is what remains after the first two words.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stop {
    time: DateTime<Tz>,
    raw_label: String,
}

impl Stop {
    pub fn new(time: DateTime<Tz>, raw_label: impl Into<String>) -> Self {
        Self {
            time,
            raw_label: raw_label.into(),
        }
    }

    pub fn time(&self) -> DateTime<Tz> {
        self.time
    }

    pub fn raw_label(&self) -> &str {
        &self.raw_label
    }

    /// Physical place name: the raw label without its first two words.
    pub fn location(&self) -> String {
        self.raw_label
            .split_whitespace()
            .skip(2)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_departing(&self) -> bool {
        self.raw_label.contains(DEPARTS_MARKER)
    }

    pub fn is_arriving(&self) -> bool {
        self.raw_label.contains(ARRIVES_MARKER)
    }
}

/// One shuttle trip: a label and its stops in timetable order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    label: String,
    stops: Vec<Stop>,
}

impl Run {
    pub fn new(label: impl Into<String>, stops: Vec<Stop>) -> Self {
        Self {
            label: label.into(),
            stops,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Itinerary text: the run label, then `HH:MM <label>` per stop.
    pub fn description(&self) -> String {
        let mut lines = Vec::with_capacity(self.stops.len() + 1);
        lines.push(self.label.clone());
        lines.extend(
            self.stops
                .iter()
                .map(|s| format!("{} {}", s.time.format("%H:%M"), s.raw_label)),
        );
        lines.join("\n")
    }
}

/// All runs of one conversion job.
#[derive(Debug, Default)]
pub struct Timetable {
    runs: Vec<Run>,
}

impl Timetable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `run` unless it has fewer than two stops. Returns whether it was kept.
    pub fn register(&mut self, run: Run) -> bool {
        if run.stops.len() < 2 {
            debug!(
                run = %run.label,
                stops = run.stops.len(),
                "Discarding run with fewer than two stops"
            );
            return false;
        }
        self.runs.push(run);
        true
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}
