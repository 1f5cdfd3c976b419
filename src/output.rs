//! Writing job results to disk.
//!
//! Everything here runs after the conversion succeeded in memory: the
//! calendar files, the tab-separated dump of the source table, and the index
//! page.

use anyhow::Result;
use csv::WriterBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::calendar::CalendarArtifact;
use crate::document::Table;

/// Calendars live in this directory below the output root.
pub const CALENDAR_DIR: &str = "cal";
pub const TABLE_DUMP_FILE: &str = "weekday_schedule.tsv";

/// Writes `table` as tab-separated text, header row first.
pub fn write_table_dump(path: &Path, table: &Table) -> Result<()> {
    debug!(path = %path.display(), rows = table.rows.len(), "Writing table dump");

    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_path(path)?;

    writer.write_record(&table.header)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes each calendar below `out_dir/cal/`.
///
/// Returns the written paths relative to `out_dir`, in artifact order.
pub fn write_calendars(out_dir: &Path, artifacts: &[CalendarArtifact]) -> Result<Vec<PathBuf>> {
    let calendar_dir = out_dir.join(CALENDAR_DIR);
    fs::create_dir_all(&calendar_dir)?;

    let mut paths = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let relative = Path::new(CALENDAR_DIR).join(&artifact.file_name);
        fs::write(out_dir.join(&relative), artifact.content.as_bytes())?;
        debug!(path = %relative.display(), "Calendar written");
        paths.push(relative);
    }

    info!(count = paths.len(), dir = %calendar_dir.display(), "Calendars written");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::PairKey;
    use tempfile::tempdir;

    fn table() -> Table {
        Table {
            header: vec![
                "Shuttle".into(),
                "Departs from Woodbury".into(),
                "Arrives at Uplands Farm".into(),
            ],
            rows: vec![
                vec!["Shuttle 1".into(), "7:00 AM".into(), "7:20 AM".into()],
                vec!["Shuttle 2".into(), "8:00 AM".into()],
            ],
        }
    }

    #[test]
    fn test_write_table_dump() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(TABLE_DUMP_FILE);

        write_table_dump(&path, &table()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Shuttle\tDeparts from Woodbury\tArrives at Uplands Farm",
                "Shuttle 1\t7:00 AM\t7:20 AM",
                "Shuttle 2\t8:00 AM",
            ]
        );
    }

    #[test]
    fn test_write_calendars_returns_relative_paths() {
        let dir = tempdir().unwrap();
        let artifacts = vec![CalendarArtifact {
            pair: PairKey::new("A", "B"),
            file_name: "A-B.ics".into(),
            content: "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n".into(),
        }];

        let paths = write_calendars(dir.path(), &artifacts).unwrap();

        assert_eq!(paths, vec![PathBuf::from("cal/A-B.ics")]);
        let written = fs::read_to_string(dir.path().join("cal/A-B.ics")).unwrap();
        assert_eq!(written, artifacts[0].content);
    }

    #[test]
    fn test_write_calendars_with_nothing_to_write() {
        let dir = tempdir().unwrap();
        let paths = write_calendars(dir.path(), &[]).unwrap();
        assert!(paths.is_empty());
        assert!(dir.path().join(CALENDAR_DIR).is_dir());
    }
}
