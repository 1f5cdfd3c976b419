//! iCalendar emission: one calendar per location-pair feed.

use chrono::{DateTime, TimeDelta, Utc};
use ical::generator::Emitter;
use ical::parser::ical::component::{IcalCalendar, IcalEvent};
use ical::property::Property;
use tracing::{debug, info};
use uuid::Uuid;

use crate::locations::GeoLocation;
use crate::synth::{EventKey, Feed, FeedSet, PairKey, ShuttleEvent};

pub const PRODUCT_ID: &str = "-//CSHL Shuttle//Schedule//EN";
pub const DEFAULT_TITLE: &str = "CSHL Shuttle";

/// Namespace for event UIDs, so a departure keeps its UID across runs.
const UID_NAMESPACE: Uuid = Uuid::from_u128(0x5d1f_0c3a_8b7e_4c1d_9a26_3f4e_b0c8_7e21);

#[derive(Debug, Clone)]
pub struct CalendarSettings {
    /// Prefix of every calendar's display name.
    pub title: String,
    /// Written as `DTSTAMP` on every event.
    pub generated_at: DateTime<Utc>,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            generated_at: Utc::now(),
        }
    }
}

/// A serialized calendar and the file name it is published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarArtifact {
    pub pair: PairKey,
    pub file_name: String,
    pub content: String,
}

/// `"<A>-<B>.ics"` with spaces and path separators replaced by underscores.
pub fn feed_file_name(pair: &PairKey) -> String {
    format!("{}-{}.ics", pair.first(), pair.second()).replace([' ', '/', '\\'], "_")
}

/// Display name built from the first word of each location.
pub fn calendar_name(title: &str, pair: &PairKey) -> String {
    format!(
        "{title}: {}-{}",
        first_word(pair.first()),
        first_word(pair.second())
    )
}

fn first_word(location: &str) -> &str {
    location.split_whitespace().next().unwrap_or_default()
}

/// Serializes every non-empty feed.
#[tracing::instrument(skip_all, fields(feeds = feeds.len()))]
pub fn render_feeds(feeds: &FeedSet, settings: &CalendarSettings) -> Vec<CalendarArtifact> {
    let artifacts: Vec<_> = feeds
        .iter()
        .filter(|(_, feed)| !feed.is_empty())
        .map(|(pair, feed)| {
            let content = build_calendar(pair, feed, settings).generate();
            debug!(pair = %pair, events = feed.len(), bytes = content.len(), "Calendar rendered");
            CalendarArtifact {
                pair: pair.clone(),
                file_name: feed_file_name(pair),
                content,
            }
        })
        .collect();

    info!(calendars = artifacts.len(), "Calendars rendered");
    artifacts
}

pub fn build_calendar(pair: &PairKey, feed: &Feed, settings: &CalendarSettings) -> IcalCalendar {
    let mut calendar = IcalCalendar::new();
    calendar.properties = vec![
        property("PRODID", PRODUCT_ID),
        property("VERSION", "2.0"),
        property("X-WR-CALNAME", calendar_name(&settings.title, pair)),
    ];
    calendar.events = feed
        .events()
        .iter()
        .map(|event| build_event(event, settings.generated_at))
        .collect();
    calendar
}

pub fn build_event(event: &ShuttleEvent, generated_at: DateTime<Utc>) -> IcalEvent {
    let mut properties = vec![
        property("UID", event_uid(&event.key)),
        property("DTSTAMP", generated_at.format("%Y%m%dT%H%M%SZ").to_string()),
        Property {
            name: "DTSTART".to_string(),
            params: Some(vec![(
                "TZID".to_string(),
                vec![event.start.timezone().name().to_string()],
            )]),
            value: Some(event.start.format("%Y%m%dT%H%M%S").to_string()),
        },
        property("DURATION", ical_duration(event.duration)),
        property("SUMMARY", escape_text(&event.summary)),
        property("DESCRIPTION", escape_text(&event.description)),
        property("RRULE", event.recurrence.rrule()),
        property("LOCATION", escape_text(&event.location)),
    ];

    if event.transparent {
        properties.push(property("TRANSP", "TRANSPARENT"));
        properties.push(property("X-MICROSOFT-CDO-BUSYSTATUS", "FREE"));
    }

    if let Some(geo) = &event.structured_location {
        properties.push(structured_location(geo));
    }

    let mut ical_event = IcalEvent::new();
    ical_event.properties = properties;
    ical_event
}

/// Stable UID derived from the departure's place and time.
pub fn event_uid(key: &EventKey) -> String {
    let name = format!("{}@{}", key.location, key.time.to_rfc3339());
    Uuid::new_v5(&UID_NAMESPACE, name.as_bytes()).to_string()
}

fn structured_location(geo: &GeoLocation) -> Property {
    Property {
        name: "X-APPLE-STRUCTURED-LOCATION".to_string(),
        params: Some(
            geo.params
                .iter()
                .map(|(key, value)| (key.to_uppercase(), vec![value.clone()]))
                .collect(),
        ),
        value: Some(geo.uri.clone()),
    }
}

fn property(name: &str, value: impl Into<String>) -> Property {
    Property {
        name: name.to_string(),
        params: None,
        value: Some(value.into()),
    }
}

/// RFC 5545 TEXT escaping.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            c => escaped.push(c),
        }
    }
    escaped
}

/// RFC 5545 DURATION for a non-negative span, e.g. `PT5M` or `PT1H30M`.
fn ical_duration(duration: TimeDelta) -> String {
    let total = duration.num_seconds().max(0);
    let (hours, minutes, seconds) = (total / 3600, total % 3600 / 60, total % 60);

    let mut out = String::from("PT");
    if hours > 0 {
        out.push_str(&format!("{hours}H"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}M"));
    }
    if seconds > 0 || total == 0 {
        out.push_str(&format!("{seconds}S"));
    }
    out
}
