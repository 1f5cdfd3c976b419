use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::America::New_York;
use chrono_tz::Tz;
use shuttle_cal::calendar::CalendarSettings;
use shuttle_cal::convert::{ConvertOptions, convert};
use shuttle_cal::document::{DelimitedExtractor, DocumentError};
use shuttle_cal::locations::LocationBook;
use shuttle_cal::parser::ServiceClock;
use shuttle_cal::synth::{EventKey, PairKey};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

const SCHEDULE: &[u8] = include_bytes!("fixtures/shuttle_schedule.tsv");

const GRACE: &str = "Grace Auditorium";
const SYOSSET: &str = "Syosset LIRR Station";
const UPLANDS: &str = "Uplands Farm";

fn options() -> ConvertOptions {
    ConvertOptions {
        clock: ServiceClock::new(New_York, NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()),
        locations: LocationBook::builtin(),
        calendar: CalendarSettings {
            title: "CSHL Shuttle".into(),
            generated_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        },
    }
}

fn at(hour: u32, minute: u32) -> DateTime<Tz> {
    New_York
        .with_ymd_and_hms(2025, 6, 2, hour, minute, 0)
        .unwrap()
}

fn departures(
    conversion: &shuttle_cal::convert::Conversion,
    a: &str,
    b: &str,
) -> Vec<(String, DateTime<Tz>)> {
    conversion
        .feeds
        .get(&PairKey::new(a, b))
        .unwrap_or_else(|| panic!("missing feed {a}-{b}"))
        .events()
        .iter()
        .map(|e| (e.location.clone(), e.start))
        .collect()
}

#[test]
fn test_full_pipeline() {
    let conversion = convert(SCHEDULE, &DelimitedExtractor::tsv(), &options())
        .expect("Failed to convert schedule");

    // The notes row has no times and is dropped; the weekend table is ignored.
    assert_eq!(conversion.table.rows.len(), 5);
    assert_eq!(conversion.timetable.len(), 4);
    assert_eq!(conversion.feeds.len(), 3);
    assert!(conversion.feeds.get(&PairKey::new(GRACE, "Woodbury")).is_none());

    assert_eq!(
        departures(&conversion, SYOSSET, GRACE),
        vec![
            (GRACE.to_string(), at(6, 45)),
            (SYOSSET.to_string(), at(7, 10)),
            (GRACE.to_string(), at(7, 15)),
            (SYOSSET.to_string(), at(7, 40)),
            (SYOSSET.to_string(), at(8, 10)),
            (GRACE.to_string(), at(8, 35)),
            (GRACE.to_string(), at(17, 0)),
            (SYOSSET.to_string(), at(17, 20)),
        ]
    );
    assert_eq!(
        departures(&conversion, GRACE, UPLANDS),
        vec![
            (GRACE.to_string(), at(6, 45)),
            (GRACE.to_string(), at(7, 35)),
            (UPLANDS.to_string(), at(7, 45)),
            (GRACE.to_string(), at(8, 35)),
        ]
    );
    assert_eq!(
        departures(&conversion, UPLANDS, SYOSSET),
        vec![
            (SYOSSET.to_string(), at(7, 10)),
            (SYOSSET.to_string(), at(8, 10)),
            (UPLANDS.to_string(), at(8, 45)),
        ]
    );
}

#[test]
fn test_layover_arrivals_never_become_events() {
    let conversion = convert(SCHEDULE, &DelimitedExtractor::tsv(), &options()).unwrap();

    let layover_arrivals = [
        EventKey {
            location: SYOSSET.into(),
            time: at(7, 5),
        },
        EventKey {
            location: GRACE.into(),
            time: at(7, 30),
        },
        EventKey {
            location: SYOSSET.into(),
            time: at(7, 35),
        },
        EventKey {
            location: GRACE.into(),
            time: at(8, 30),
        },
    ];
    for (pair, feed) in conversion.feeds.iter() {
        for key in &layover_arrivals {
            assert!(!feed.contains(key), "{pair} holds layover arrival {key:?}");
        }
    }
}

#[test]
fn test_feeds_never_repeat_a_departure() {
    let conversion = convert(SCHEDULE, &DelimitedExtractor::tsv(), &options()).unwrap();

    for (pair, feed) in conversion.feeds.iter() {
        let unique: HashSet<_> = feed.events().iter().map(|e| &e.key).collect();
        assert_eq!(unique.len(), feed.len(), "duplicate event in {pair}");
    }
}

#[test]
fn test_known_locations_carry_geo_metadata() {
    let conversion = convert(SCHEDULE, &DelimitedExtractor::tsv(), &options()).unwrap();
    let feed = conversion.feeds.get(&PairKey::new(GRACE, UPLANDS)).unwrap();

    for event in feed.events() {
        let geo = event.structured_location.as_ref().unwrap();
        assert_eq!(geo.params["x-title"], event.location);
    }
}

#[test]
fn test_convert_and_write_outputs() {
    let conversion = convert(SCHEDULE, &DelimitedExtractor::tsv(), &options()).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let paths = conversion
        .write(dir.path(), "CSHL Shuttle", "webcal://example.org/shuttle")
        .unwrap();

    assert_eq!(
        paths,
        vec![
            PathBuf::from("cal/Grace_Auditorium-Syosset_LIRR_Station.ics"),
            PathBuf::from("cal/Grace_Auditorium-Uplands_Farm.ics"),
            PathBuf::from("cal/Syosset_LIRR_Station-Uplands_Farm.ics"),
        ]
    );

    let calendar =
        fs::read_to_string(dir.path().join("cal/Grace_Auditorium-Uplands_Farm.ics")).unwrap();
    assert!(calendar.contains("X-WR-CALNAME:CSHL Shuttle: Grace-Uplands"));
    assert_eq!(calendar.matches("BEGIN:VEVENT").count(), 4);

    let dump = fs::read_to_string(dir.path().join("weekday_schedule.tsv")).unwrap();
    assert_eq!(dump.lines().count(), 6);
    assert!(dump.starts_with("Shuttle\tDeparts from Grace Auditorium"));

    let index = fs::read_to_string(dir.path().join("index.html")).unwrap();
    assert!(index.contains("Grace_Auditorium-Uplands_Farm.ics"));
    assert!(index.contains("Syosset LIRR Station-Uplands Farm"));
}

#[test]
fn test_multi_page_document_is_rejected() {
    let mut two_pages = SCHEDULE.to_vec();
    two_pages.push(b'\x0c');
    two_pages.extend_from_slice(SCHEDULE);

    let err = convert(&two_pages, &DelimitedExtractor::tsv(), &options()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<DocumentError>(),
        Some(&DocumentError::PageCount(2))
    );
}
