//! Route-to-event synthesis.
//!
//! Every genuine departure in a run becomes one recurring calendar event, and
//! that event is placed in the feed of every location pair it connects: each
//! later stop of the run, plus the run's first stop to close the loop.
//! Feeds never hold two events for the same place and time.

pub mod engine;
pub mod types;

pub use engine::{EVENT_DURATION_MINUTES, departure_event, layover_stops, synthesize};
pub use types::{EventKey, Feed, FeedSet, PairKey, Recurrence, ShuttleEvent};
