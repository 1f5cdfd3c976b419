//! One conversion job: document bytes in, calendars out.
//!
//! [`convert`] does all the work in memory and fails before anything is
//! written; [`Conversion::write`] then publishes the results.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::calendar::{CalendarArtifact, CalendarSettings, render_feeds};
use crate::document::{Table, TableExtractor, weekday_table};
use crate::index::{INDEX_FILE, render_index};
use crate::locations::LocationBook;
use crate::output::{TABLE_DUMP_FILE, write_calendars, write_table_dump};
use crate::parser::{ServiceClock, parse_table};
use crate::synth::{FeedSet, synthesize};
use crate::timetable::Timetable;

pub struct ConvertOptions {
    pub clock: ServiceClock,
    pub locations: LocationBook,
    pub calendar: CalendarSettings,
}

/// Everything a successful job produced.
#[derive(Debug)]
pub struct Conversion {
    pub table: Table,
    pub timetable: Timetable,
    pub feeds: FeedSet,
    pub calendars: Vec<CalendarArtifact>,
}

/// Extracts, parses, and synthesizes calendars from a schedule document.
#[tracing::instrument(skip_all, fields(bytes = bytes.len()))]
pub fn convert(
    bytes: &[u8],
    extractor: &dyn TableExtractor,
    options: &ConvertOptions,
) -> Result<Conversion> {
    let document = extractor.extract(bytes)?;
    let table = weekday_table(&document)?.clone();

    let timetable = parse_table(&table, &options.clock);
    let feeds = synthesize(&timetable, &options.locations);
    let calendars = render_feeds(&feeds, &options.calendar);

    Ok(Conversion {
        table,
        timetable,
        feeds,
        calendars,
    })
}

impl Conversion {
    /// Writes the table dump, the calendars, and the index page below
    /// `out_dir`. Returns the calendar paths relative to `out_dir`.
    #[tracing::instrument(skip(self, out_dir), fields(out_dir = %out_dir.display()))]
    pub fn write(&self, out_dir: &Path, title: &str, base_url: &str) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(out_dir)?;

        write_table_dump(&out_dir.join(TABLE_DUMP_FILE), &self.table)?;
        let paths = write_calendars(out_dir, &self.calendars)?;

        let index = render_index(title, base_url, &paths)?;
        fs::write(out_dir.join(INDEX_FILE), index)?;

        info!(calendars = paths.len(), "Conversion written");
        Ok(paths)
    }
}
