//! payproj CLI - Payment Projection Calendar
//!
//! Command-line interface for browsing, editing and exporting payment
//! projections laid out on a business-day calendar.

mod config;
mod data;
mod report;

use std::io;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use payproj_core::{
    parse_day, GridRenderer, NewProjection, ProjectionFilter, ProjectionId, ProjectionPatch,
    ProjectionSource, ProjectionStatus,
};
use payproj_grid::{CalendarFilter, CalendarView, Notice, NoticeLevel};
use rust_decimal::Decimal;
use serde_json::json;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::data::JsonFileSource;
use crate::report::{JsonEmitter, NoticeEmitter, Reporter, TerminalEmitter};

/// Calendar span used when `--to` is omitted
const DEFAULT_SPAN_DAYS: u64 = 13;

#[derive(Parser)]
#[command(name = "payproj")]
#[command(author, version, about = "Payment projection calendar", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Settings file (defaults to ./payproj.toml when present)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Projection data file (JSON array of records)
    #[arg(
        long,
        value_name = "FILE",
        env = "PAYPROJ_DATA",
        default_value = "projections.json",
        global = true
    )]
    data: PathBuf,

    /// Report format
    #[arg(long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug, Clone)]
struct RangeArgs {
    /// First date (defaults to today)
    #[arg(long, value_parser = parse_date)]
    from: Option<NaiveDate>,

    /// Last date (defaults to two weeks after --from)
    #[arg(long, value_parser = parse_date)]
    to: Option<NaiveDate>,

    /// Number of business-day columns (defaults to max_days)
    #[arg(long)]
    count: Option<usize>,
}

impl RangeArgs {
    fn resolve(&self, config: &Config) -> (NaiveDate, NaiveDate, usize) {
        let from = self.from.unwrap_or_else(|| Local::now().date_naive());
        let to = self.to.unwrap_or_else(|| {
            from.checked_add_days(Days::new(DEFAULT_SPAN_DAYS))
                .unwrap_or(from)
        });
        (from, to, self.count.unwrap_or(config.max_days))
    }

    fn calendar_filter(&self, config: &Config, status: Option<ProjectionStatus>) -> CalendarFilter {
        let (from, to, count) = self.resolve(config);
        let filter = CalendarFilter::new(from, to).max_days(count);
        match status {
            Some(status) => filter.status(status),
            None => filter,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the business days of a range
    Days {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Print the projection grid
    Grid {
        #[command(flatten)]
        range: RangeArgs,

        /// Only show projections with this status
        #[arg(long)]
        status: Option<ProjectionStatus>,
    },

    /// Export the projection grid to Excel
    Export {
        #[command(flatten)]
        range: RangeArgs,

        /// Only show projections with this status
        #[arg(long)]
        status: Option<ProjectionStatus>,

        /// Output file or directory (defaults to output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create a projection
    Create {
        #[arg(long)]
        client_id: u64,

        #[arg(long, default_value = "")]
        client_name: String,

        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,

        #[arg(long)]
        amount: Decimal,

        #[arg(long, default_value = "pending")]
        status: ProjectionStatus,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Update a projection
    Update {
        /// Projection id
        id: ProjectionId,

        #[arg(long)]
        amount: Option<Decimal>,

        #[arg(long)]
        status: Option<ProjectionStatus>,

        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,
    },
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    parse_day(raw).map_err(|e| e.to_string())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code.into(),
        Err(err) => {
            eprintln!("error: {err:#}");
            process::ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<report::ExitCode> {
    let config = Config::load(cli.config.as_deref())?;
    let mut reporter = match cli.format {
        OutputFormat::Text => Reporter::Terminal(TerminalEmitter::new(io::stderr(), cli.quiet)),
        OutputFormat::Json => Reporter::Json(JsonEmitter::new(cli.quiet)),
    };
    let json = cli.format == OutputFormat::Json;

    match cli.command {
        Commands::Days { range } => {
            let (from, to, count) = range.resolve(&config);
            let days = config.sequencer().generate(from, to, count);
            if json {
                let days: Vec<String> = days.iter().map(ToString::to_string).collect();
                return Ok(reporter.finish(json!({ "days": days })));
            }
            for day in &days {
                println!("{day}  {}", day.weekday_name());
            }
            Ok(reporter.finish(serde_json::Value::Null))
        }

        Commands::Grid { range, status } => {
            let source = open_source(&cli.data)?;
            let filter = range.calendar_filter(&config, status);
            let Some(view) = load_view(&config, filter, &source, &mut reporter) else {
                return Ok(reporter.finish(serde_json::Value::Null));
            };

            let grid = view.grid();
            let table = config
                .text_renderer()
                .render(&grid)
                .context("Failed to render grid")?;
            if json {
                return Ok(reporter.finish(json!({
                    "days": grid.days.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "clients": grid.groups.len(),
                    "grandTotal": grid.totals.grand.to_string(),
                    "table": table,
                })));
            }
            print!("{table}");
            Ok(reporter.finish(serde_json::Value::Null))
        }

        Commands::Export {
            range,
            status,
            output,
        } => {
            let source = open_source(&cli.data)?;
            let filter = range.calendar_filter(&config, status);
            let Some(view) = load_view(&config, filter, &source, &mut reporter) else {
                return Ok(reporter.finish(serde_json::Value::Null));
            };

            let target = output.unwrap_or_else(|| config.output_dir.clone());
            let mut payload = serde_json::Value::Null;
            match config.exporter().export_to_path(&view.grid(), &target) {
                Ok(path) => {
                    reporter.emit(Notice::success(format!(
                        "Exported projections to {}",
                        path.display()
                    )));
                    payload = json!({ "path": path.display().to_string() });
                }
                Err(err) => {
                    reporter.emit(Notice::error(format!("Could not export projections: {err}")));
                }
            }
            Ok(reporter.finish(payload))
        }

        Commands::Create {
            client_id,
            client_name,
            date,
            amount,
            status,
            notes,
        } => {
            let source = open_source(&cli.data)?;
            let mut view = CalendarView::new(CalendarFilter::new(date, date))
                .with_sequencer(config.sequencer());

            let mut input = NewProjection::new(client_id, date, amount)
                .client_name(client_name)
                .status(status);
            if let Some(notes) = notes {
                input = input.notes(notes);
            }

            let notice = view.create(&source, input);
            let created = !notice.is_error();
            reporter.emit(notice);

            let payload = match view.store().records().last() {
                Some(record) if created => serde_json::to_value(&**record)?,
                _ => serde_json::Value::Null,
            };
            Ok(reporter.finish(payload))
        }

        Commands::Update {
            id,
            amount,
            status,
            date,
            notes,
        } => {
            let source = open_source(&cli.data)?;
            let mut patch = ProjectionPatch::new();
            if let Some(amount) = amount {
                patch = patch.amount(amount);
            }
            if let Some(status) = status {
                patch = patch.status(status);
            }
            if let Some(date) = date {
                patch = patch.projected_date(date);
            }
            if let Some(notes) = notes {
                patch = patch.notes(notes);
            }

            // Load the record's current day so the result reconciles into the view
            let known_day = current_day(&source, id);
            let anchor = known_day.unwrap_or_else(|| Local::now().date_naive());
            let mut view = CalendarView::new(CalendarFilter::new(anchor, anchor).max_days(1))
                .with_sequencer(config.sequencer());
            if known_day.is_some() {
                let loaded = view.refresh(&source);
                if loaded.is_error() {
                    reporter.emit(loaded);
                }
            }

            let notice = view.update(&source, id, patch);
            let updated = notice.level == NoticeLevel::Success;
            reporter.emit(notice);

            let payload = match view.store().get(id) {
                Some(record) if updated => serde_json::to_value(&**record)?,
                _ => serde_json::Value::Null,
            };
            Ok(reporter.finish(payload))
        }
    }
}

fn open_source(path: &std::path::Path) -> Result<JsonFileSource> {
    JsonFileSource::open(path)
        .with_context(|| format!("Failed to open data file {}", path.display()))
}

/// Projected date of record `id`, if the source has it
fn current_day(source: &JsonFileSource, id: ProjectionId) -> Option<NaiveDate> {
    source
        .fetch(&ProjectionFilter::new())
        .ok()?
        .into_iter()
        .find(|record| record.id == id)
        .map(|record| record.projected_date)
}

/// Build a view and load it; `None` when the fetch failed
fn load_view(
    config: &Config,
    filter: CalendarFilter,
    source: &JsonFileSource,
    reporter: &mut Reporter,
) -> Option<CalendarView> {
    let mut view = CalendarView::new(filter).with_sequencer(config.sequencer());
    let notice = view.refresh(source);
    let failed = notice.is_error();
    reporter.emit(notice);
    (!failed).then_some(view)
}
