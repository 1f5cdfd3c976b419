use std::collections::HashSet;

use chrono::TimeDelta;
use tracing::{debug, info};

use crate::locations::LocationBook;
use crate::synth::types::{EventKey, FeedSet, PairKey, Recurrence, ShuttleEvent};
use crate::timetable::{Run, Stop, Timetable};

/// Events are kept short so they do not crowd the calendar.
pub const EVENT_DURATION_MINUTES: i64 = 5;

/// Stops that are the arrival half of a layover.
///
/// An arrival directly followed by a departure from the same location is the
/// shuttle standing still; only the departure is a real departure.
pub fn layover_stops(run: &Run) -> HashSet<&Stop> {
    run.stops()
        .windows(2)
        .filter_map(|pair| {
            let (fr, to) = (&pair[0], &pair[1]);
            (fr.location() == to.location() && fr.is_arriving() && to.is_departing())
                .then_some(fr)
        })
        .collect()
}

/// The calendar event for departing `stop` on `run`.
pub fn departure_event(run: &Run, stop: &Stop, book: &LocationBook) -> ShuttleEvent {
    let location = stop.location();
    ShuttleEvent {
        key: EventKey::of(stop),
        start: stop.time(),
        duration: TimeDelta::minutes(EVENT_DURATION_MINUTES),
        summary: location.clone(),
        description: run.description(),
        recurrence: Recurrence::Weekdays,
        structured_location: book.get(&location).cloned(),
        location,
        transparent: true,
    }
}

/// Places every departure of every run into the feeds it connects.
#[tracing::instrument(skip_all, fields(runs = timetable.len()))]
pub fn synthesize(timetable: &Timetable, book: &LocationBook) -> FeedSet {
    let mut feeds = FeedSet::default();

    for run in timetable.runs() {
        let layovers = layover_stops(run);
        let stops = run.stops();

        for (i, fr) in stops.iter().enumerate() {
            if layovers.contains(fr) {
                debug!(run = %run.label(), stop = %fr.raw_label(), "Skipping layover arrival");
                continue;
            }

            let event = departure_event(run, fr, book);
            let destinations = stops[i + 1..].iter().chain(stops.first());

            for to in destinations {
                if to.location() == event.location {
                    continue;
                }
                let pair = PairKey::new(event.location.as_str(), to.location());
                feeds.feed_mut(pair).insert(&event);
            }
        }
    }

    info!(
        feeds = feeds.len(),
        events = feeds.event_count(),
        "Feeds synthesized"
    );
    feeds
}
