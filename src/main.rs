//! CLI entry point for the shuttle calendar generator.
//!
//! `convert` turns a shuttle timetable into one iCalendar feed per pair of
//! stops, plus an index page; `inspect` runs the same pipeline and only logs
//! what it found.

use anyhow::Result;
use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand, ValueEnum};
use shuttle_cal::{
    calendar::{CalendarSettings, DEFAULT_TITLE},
    convert::{Conversion, ConvertOptions, convert},
    document::DelimitedExtractor,
    fetch::{BasicClient, DEFAULT_TIMEOUT, load_source},
    index::DEFAULT_BASE_URL,
    locations::LocationBook,
    parser::ServiceClock,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "shuttle_cal")]
#[command(about = "Turn a shuttle timetable into calendar feeds per pair of stops", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a timetable and write calendars, the table dump, and the index page
    Convert {
        #[command(flatten)]
        job: JobArgs,

        /// Directory to write results into
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// URL prefix the calendar links on the index page point to
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,
    },
    /// Parse a timetable and log runs and feeds without writing anything
    Inspect {
        #[command(flatten)]
        job: JobArgs,
    },
}

#[derive(Args)]
struct JobArgs {
    /// Path to file or URL to fetch
    #[arg(value_name = "FILE_OR_URL")]
    source: String,

    /// Layout of the timetable document
    #[arg(short, long, value_enum, default_value_t = TableFormat::Tsv)]
    format: TableFormat,

    /// Timezone the timetable's clock times are in
    #[arg(long, default_value = "America/New_York", value_parser = parse_timezone)]
    timezone: Tz,

    /// First service day (YYYY-MM-DD); weekends move to the next Monday. Defaults to today
    #[arg(long)]
    service_date: Option<NaiveDate>,

    /// JSON file replacing the built-in location metadata
    #[arg(long)]
    locations: Option<PathBuf>,

    /// Calendar name prefix
    #[arg(long, default_value = DEFAULT_TITLE)]
    title: String,

    /// Download timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum TableFormat {
    Tsv,
    Csv,
}

impl TableFormat {
    fn extractor(self) -> DelimitedExtractor {
        match self {
            TableFormat::Tsv => DelimitedExtractor::tsv(),
            TableFormat::Csv => DelimitedExtractor::csv(),
        }
    }
}

fn parse_timezone(name: &str) -> Result<Tz, String> {
    name.parse::<Tz>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/shuttle_cal.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("shuttle_cal.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            job,
            out_dir,
            base_url,
        } => {
            let conversion = run_job(&job).await?;
            let paths = conversion.write(&out_dir, &job.title, &base_url)?;
            info!(
                calendars = paths.len(),
                out_dir = %out_dir.display(),
                "Conversion complete"
            );
        }
        Commands::Inspect { job } => {
            let conversion = run_job(&job).await?;
            log_summary(&conversion);
        }
    }

    Ok(())
}

/// Loads the document and converts it in memory.
#[tracing::instrument(skip_all, fields(source = %job.source))]
async fn run_job(job: &JobArgs) -> Result<Conversion> {
    let locations = match &job.locations {
        Some(path) => LocationBook::load(path)?,
        None => LocationBook::builtin(),
    };
    let clock = match job.service_date {
        Some(date) => ServiceClock::starting_on(job.timezone, date),
        None => ServiceClock::today(job.timezone),
    };
    info!(
        timezone = %clock.timezone(),
        service_date = %clock.service_date(),
        locations = locations.len(),
        "Job configured"
    );

    let client = BasicClient::with_timeout(Duration::from_secs(job.timeout_secs))?;
    let bytes = load_source(&client, &job.source).await?;

    let options = ConvertOptions {
        clock,
        locations,
        calendar: CalendarSettings {
            title: job.title.clone(),
            ..CalendarSettings::default()
        },
    };
    let extractor = job.format.extractor();
    convert(&bytes, &extractor, &options)
}

fn log_summary(conversion: &Conversion) {
    for run in conversion.timetable.runs() {
        info!(run = %run.label(), stops = run.stops().len(), "Run");
        for stop in run.stops() {
            debug!(
                run = %run.label(),
                time = %stop.time().format("%H:%M"),
                location = %stop.location(),
                departing = stop.is_departing(),
                arriving = stop.is_arriving(),
                "Stop"
            );
        }
    }

    for (pair, feed) in conversion.feeds.iter() {
        info!(pair = %pair, events = feed.len(), "Feed");
    }

    info!(
        table_rows = conversion.table.rows.len(),
        runs = conversion.timetable.len(),
        feeds = conversion.feeds.len(),
        events = conversion.feeds.event_count(),
        calendars = conversion.calendars.len(),
        "Inspection summary"
    );
}
