//! Table parser: turns the weekday table into a [`Timetable`] of runs.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use tracing::{debug, info, trace};

use crate::document::Table;
use crate::timetable::{Run, Stop, Timetable};

/// Accepted time-of-day layouts, tried in order after normalization.
const TIME_FORMATS: &[&str] = &[
    "%H:%M",
    "%H:%M:%S",
    "%I:%M %p",
    "%I:%M%p",
    "%I:%M:%S %p",
];

/// Anchors timetable wall-clock times to one civil timezone and service date.
#[derive(Debug, Clone, Copy)]
pub struct ServiceClock {
    timezone: Tz,
    service_date: NaiveDate,
}

impl ServiceClock {
    pub fn new(timezone: Tz, service_date: NaiveDate) -> Self {
        Self {
            timezone,
            service_date,
        }
    }

    /// Anchors to the first weekday on or after `date`.
    ///
    /// Events recur Monday to Friday, and the anchor date is their first
    /// occurrence, so it must not fall on a weekend.
    pub fn starting_on(timezone: Tz, date: NaiveDate) -> Self {
        Self::new(timezone, first_weekday_from(date))
    }

    /// Anchors to today in `timezone`, or the next Monday on a weekend.
    pub fn today(timezone: Tz) -> Self {
        Self::starting_on(timezone, Utc::now().with_timezone(&timezone).date_naive())
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn service_date(&self) -> NaiveDate {
        self.service_date
    }

    /// Parses a timetable cell. Returns `None` for anything that is not a time.
    pub fn parse(&self, cell: &str) -> Option<DateTime<Tz>> {
        let time = parse_time_of_day(cell)?;
        self.timezone
            .from_local_datetime(&self.service_date.and_time(time))
            .earliest()
    }
}

/// `date` itself on Monday to Friday, otherwise the following Monday.
pub fn first_weekday_from(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date + chrono::Days::new(2),
        Weekday::Sun => date + chrono::Days::new(1),
        _ => date,
    }
}

fn parse_time_of_day(cell: &str) -> Option<NaiveTime> {
    let normalized = cell.trim().to_uppercase().replace('.', "");
    if normalized.is_empty() {
        return None;
    }
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(&normalized, format).ok())
}

/// Builds one run per data row of `table`.
///
/// The first column carries the run label and every other column header is
/// the stop label. Cells that are not times are dropped; rows without any
/// cells after the label are skipped; runs left with fewer than two stops are
/// discarded.
#[tracing::instrument(skip_all, fields(rows = table.rows.len(), columns = table.header.len()))]
pub fn parse_table(table: &Table, clock: &ServiceClock) -> Timetable {
    let titles = table.header.get(1..).unwrap_or_default();
    let mut timetable = Timetable::new();

    for row in &table.rows {
        let Some((label, cells)) = row.split_first() else {
            debug!("Skipping empty row");
            continue;
        };
        if cells.is_empty() {
            debug!(run = %label, "Skipping row without stop cells");
            continue;
        }

        let stops = cells
            .iter()
            .zip(titles)
            .filter_map(|(cell, title)| match clock.parse(cell) {
                Some(time) => Some(Stop::new(time, title.as_str())),
                None => {
                    trace!(run = %label, stop = %title, cell = %cell, "Dropping non-time cell");
                    None
                }
            })
            .collect();

        timetable.register(Run::new(label.as_str(), stops));
    }

    info!(runs = timetable.len(), "Timetable parsed");
    timetable
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Offset, Timelike};
    use chrono_tz::America::New_York;

    fn clock() -> ServiceClock {
        ServiceClock::new(New_York, NaiveDate::from_ymd_opt(2025, 6, 2).unwrap())
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn table(header: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            header: row(header),
            rows: rows.iter().map(|r| row(r)).collect(),
        }
    }

    #[test]
    fn test_parse_accepts_common_layouts() {
        let clock = clock();
        for (cell, hour, minute) in [
            ("8:00", 8, 0),
            ("08:05", 8, 5),
            ("17:45", 17, 45),
            ("8:00 AM", 8, 0),
            ("12:30 PM", 12, 30),
            ("12:10 AM", 0, 10),
            ("5:15pm", 17, 15),
            ("5:15 p.m.", 17, 15),
            ("  6:40 ", 6, 40),
            ("07:00:00", 7, 0),
        ] {
            let time = clock.parse(cell).unwrap_or_else(|| panic!("{cell} should parse"));
            assert_eq!((time.hour(), time.minute()), (hour, minute), "{cell}");
            assert_eq!(time.date_naive(), clock.service_date());
        }
    }

    #[test]
    fn test_parse_rejects_non_times() {
        let clock = clock();
        for cell in ["", "-", "—", "No service", "25:00", "8", "Shuttle 1"] {
            assert!(clock.parse(cell).is_none(), "{cell} should not parse");
        }
    }

    #[test]
    fn test_parse_uses_clock_timezone() {
        let time = clock().parse("8:00").unwrap();
        assert_eq!(time.timezone(), New_York);
        // EDT in June.
        assert_eq!(time.with_timezone(&Utc).hour(), 12);
    }

    #[test]
    fn test_parse_drops_times_skipped_by_dst() {
        let spring_forward =
            ServiceClock::new(New_York, NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());
        assert!(spring_forward.parse("2:30 AM").is_none());
        assert!(spring_forward.parse("3:30 AM").is_some());
    }

    #[test]
    fn test_parse_resolves_repeated_dst_hour_to_earliest() {
        let fall_back = ServiceClock::new(New_York, NaiveDate::from_ymd_opt(2025, 11, 2).unwrap());
        let time = fall_back.parse("1:30 AM").unwrap();

        assert_eq!((time.hour(), time.minute()), (1, 30));
        // Still EDT: the first of the two 1:30s.
        assert_eq!(time.offset().fix().local_minus_utc(), -4 * 3600);
        assert_eq!(time.with_timezone(&Utc).hour(), 5);
    }

    #[test]
    fn test_weekend_anchor_moves_to_monday() {
        let saturday = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let friday = NaiveDate::from_ymd_opt(2026, 10, 23).unwrap();

        assert_eq!(first_weekday_from(saturday), monday);
        assert_eq!(first_weekday_from(sunday), monday);
        assert_eq!(first_weekday_from(monday), monday);
        assert_eq!(first_weekday_from(friday), friday);

        let clock = ServiceClock::starting_on(New_York, saturday);
        assert_eq!(clock.service_date(), monday);
        assert_eq!(clock.parse("8:00").unwrap().weekday(), Weekday::Mon);
    }

    #[test]
    fn test_today_is_never_a_weekend() {
        let weekday = ServiceClock::today(New_York).service_date().weekday();
        assert!(!matches!(weekday, Weekday::Sat | Weekday::Sun));
    }

    #[test]
    fn test_parse_table_builds_runs_in_column_order() {
        let table = table(
            &["Shuttle", "Departs from Woodbury", "Arrives at Uplands Farm", "Arrives at Knight House"],
            &[&["Shuttle 1", "7:00 AM", "7:20 AM", "7:35 AM"]],
        );
        let timetable = parse_table(&table, &clock());

        assert_eq!(timetable.len(), 1);
        let run = &timetable.runs()[0];
        assert_eq!(run.label(), "Shuttle 1");
        let labels: Vec<_> = run.stops().iter().map(|s| s.raw_label()).collect();
        assert_eq!(
            labels,
            vec!["Departs from Woodbury", "Arrives at Uplands Farm", "Arrives at Knight House"]
        );
    }

    #[test]
    fn test_parse_table_drops_unparsable_cells_not_rows() {
        let table = table(
            &["Shuttle", "Departs from Woodbury", "Arrives at Uplands Farm", "Arrives at Knight House"],
            &[&["Shuttle 2", "7:00 AM", "-", "7:35 AM"]],
        );
        let timetable = parse_table(&table, &clock());

        let run = &timetable.runs()[0];
        assert_eq!(run.stops().len(), 2);
        assert_eq!(run.stops()[1].location(), "Knight House");
    }

    #[test]
    fn test_parse_table_skips_malformed_and_degenerate_rows() {
        let table = table(
            &["Shuttle", "Departs from Woodbury", "Arrives at Uplands Farm"],
            &[
                &[],
                &["Label only"],
                &["All blank", "", ""],
                &["One stop", "7:00 AM", "n/a"],
                &["Good", "8:00 AM", "8:20 AM"],
            ],
        );
        let timetable = parse_table(&table, &clock());

        assert_eq!(timetable.len(), 1);
        assert_eq!(timetable.runs()[0].label(), "Good");
    }

    #[test]
    fn test_parse_table_ignores_cells_without_header() {
        let table = table(
            &["Shuttle", "Departs from Woodbury", "Arrives at Uplands Farm"],
            &[&["Shuttle 3", "8:00", "8:20", "8:40"]],
        );
        let timetable = parse_table(&table, &clock());
        assert_eq!(timetable.runs()[0].stops().len(), 2);
    }
}
