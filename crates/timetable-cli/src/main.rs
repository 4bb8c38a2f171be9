//! `timetable` CLI: check, staff, and publish exam timetables from JSON files.
//!
//! ## Usage
//!
//! ```sh
//! # List conflicts in a slot list or timetable snapshot (exit code 1 if any)
//! timetable check -i slots.json
//!
//! # Free windows of a room on a date
//! timetable free -i timetable.json --date 2025-06-10 --room R1 --from 08:00 --to 18:00
//!
//! # Assign an invigilator and write the updated snapshot
//! timetable assign -i timetable.json --slot s-1 --faculty F1 -o timetable.json
//!
//! # Publish an assessment's timetable if it is conflict-free
//! timetable publish -i timetable.json --assessment midterm-2025 -o timetable.json
//!
//! # Readiness overview as JSON
//! timetable --json summary -i timetable.json --assessment midterm-2025
//! ```
//!
//! Input is either a bare JSON array of slots or a snapshot object with
//! `assessments` and `slots`. Logs go to stderr; `RUST_LOG` overrides `-v`.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use timetable_engine::slot::parse_time;
use timetable_engine::{
    detect_conflicts, Conflict, ExamSlot, FreeWindow, InMemoryStore, Resource, SchedulerConfig,
    SlotFilter, Snapshot, TimetableError, TimetableScheduler, TimetableSummary,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "timetable",
    version,
    about = "Exam timetable conflict checker and publisher"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log scheduler decisions at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Format of log lines written to stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Scheduler config file (TOML). Falls back to TIMETABLE_* environment variables
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect room, batch, and invigilator conflicts
    Check {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Only check slots of this assessment
        #[arg(long)]
        assessment: Option<String>,
    },
    /// List free windows of a room, batch, or invigilator on a date
    Free {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Exam date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        #[command(flatten)]
        resource: ResourceArgs,
        /// Start of the daily window (HH:MM)
        #[arg(long, default_value = "08:00", value_parser = parse_time)]
        from: NaiveTime,
        /// End of the daily window (HH:MM)
        #[arg(long, default_value = "18:00", value_parser = parse_time)]
        to: NaiveTime,
        /// Only list windows of at least this many minutes
        #[arg(long)]
        min_duration: Option<i64>,
        /// Print only the earliest matching window
        #[arg(long)]
        first: bool,
    },
    /// Assign an invigilator to a slot unless they supervise an overlapping exam
    Assign {
        /// Input snapshot (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file for the updated snapshot (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long)]
        slot: String,
        #[arg(long)]
        faculty: String,
    },
    /// Remove an invigilator from a slot
    Unassign {
        /// Input snapshot (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file for the updated snapshot (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long)]
        slot: String,
        #[arg(long)]
        faculty: String,
    },
    /// Move a scheduled assessment to ongoing if its timetable is conflict-free
    Publish {
        /// Input snapshot (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file for the updated snapshot (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long)]
        assessment: String,
    },
    /// Show slot, coverage, and conflict counts for an assessment
    Summary {
        /// Input snapshot (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        #[arg(long)]
        assessment: String,
    },
}

/// Exactly one resource selector for `free`.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct ResourceArgs {
    #[arg(long)]
    room: Option<String>,
    #[arg(long)]
    batch: Option<String>,
    /// Faculty (invigilator) id
    #[arg(long)]
    faculty: Option<String>,
}

impl ResourceArgs {
    fn resource(&self) -> Result<Resource> {
        let (kind, id) = match (&self.room, &self.batch, &self.faculty) {
            (Some(id), _, _) => ("room", id),
            (_, Some(id), _) => ("batch", id),
            (_, _, Some(id)) => ("faculty", id),
            _ => bail!("one of --room, --batch, or --faculty is required"),
        };
        Resource::from_parts(kind, id).with_context(|| format!("--{kind} must not be blank"))
    }
}

/// Accepted input shapes.
#[derive(Deserialize)]
#[serde(untagged)]
enum TimetableInput {
    Slots(Vec<ExamSlot>),
    Snapshot(Snapshot),
}

impl TimetableInput {
    fn into_snapshot(self) -> Snapshot {
        match self {
            Self::Slots(slots) => Snapshot {
                assessments: Vec::new(),
                slots,
            },
            Self::Snapshot(snapshot) => snapshot,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    match cli.command {
        Commands::Check { input, assessment } => {
            let snapshot = read_snapshot(input.as_deref())?;
            let slots: Vec<ExamSlot> = match assessment.as_deref() {
                Some(id) => {
                    let filter = SlotFilter::new().assessment(id);
                    snapshot
                        .slots
                        .into_iter()
                        .filter(|s| filter.matches(s))
                        .collect()
                }
                None => snapshot.slots,
            };
            let conflicts = detect_conflicts(&slots);
            debug!(slots = slots.len(), conflicts = conflicts.len(), "Checked timetable");
            print_conflicts(&conflicts, slots.len(), cli.json)?;
            if !conflicts.is_empty() {
                process::exit(1);
            }
        }
        Commands::Free {
            input,
            date,
            resource,
            from,
            to,
            min_duration,
            first,
        } => {
            let resource = resource.resource()?;
            let scheduler = load_scheduler(input.as_deref(), cli.config.as_deref())?;
            let min = min_duration.unwrap_or(0);
            let windows: Vec<FreeWindow> = if first {
                scheduler
                    .first_free_window(&resource, date, from, to, min)
                    .await?
                    .into_iter()
                    .collect()
            } else {
                let mut windows = scheduler.free_windows(&resource, date, from, to).await?;
                windows.retain(|w| w.duration_minutes >= min);
                windows
            };
            print_free_windows(&windows, &resource, date, cli.json)?;
        }
        Commands::Assign {
            input,
            output,
            slot,
            faculty,
        } => {
            let scheduler = load_scheduler(input.as_deref(), cli.config.as_deref())?;
            let result = scheduler.assign_invigilator(&slot, &faculty).await;
            exit_on_conflict(result, cli.json)?;
            write_snapshot(output.as_deref(), scheduler.store()).await?;
        }
        Commands::Unassign {
            input,
            output,
            slot,
            faculty,
        } => {
            let scheduler = load_scheduler(input.as_deref(), cli.config.as_deref())?;
            scheduler.remove_invigilator(&slot, &faculty).await?;
            write_snapshot(output.as_deref(), scheduler.store()).await?;
        }
        Commands::Publish {
            input,
            output,
            assessment,
        } => {
            let scheduler = load_scheduler(input.as_deref(), cli.config.as_deref())?;
            let result = scheduler.publish_timetable(&assessment).await;
            exit_on_conflict(result, cli.json)?;
            info!(assessment_id = %assessment, "Published");
            write_snapshot(output.as_deref(), scheduler.store()).await?;
        }
        Commands::Summary { input, assessment } => {
            let scheduler = load_scheduler(input.as_deref(), cli.config.as_deref())?;
            let summary = scheduler.timetable_summary(&assessment).await?;
            print_summary(&summary, cli.json)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool, format: LogFormat) {
    let default = if verbose {
        "timetable=debug,timetable_engine=debug"
    } else {
        "timetable=info,timetable_engine=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn load_config(path: Option<&Path>) -> Result<SchedulerConfig> {
    match path {
        Some(path) => SchedulerConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => SchedulerConfig::from_env().context("Invalid TIMETABLE_* environment"),
    }
}

fn load_scheduler(
    input: Option<&str>,
    config: Option<&Path>,
) -> Result<TimetableScheduler<InMemoryStore>> {
    let config = load_config(config)?;
    let snapshot = read_snapshot(input)?;
    Ok(TimetableScheduler::with_config(
        InMemoryStore::from_snapshot(snapshot),
        config,
    ))
}

fn read_snapshot(path: Option<&str>) -> Result<Snapshot> {
    let raw = read_input(path)?;
    let input: TimetableInput = serde_json::from_str(&raw)
        .context("Input must be a JSON array of slots or a snapshot object")?;
    let snapshot = input.into_snapshot();
    debug!(
        assessments = snapshot.assessments.len(),
        slots = snapshot.slots.len(),
        "Loaded timetable"
    );
    Ok(snapshot)
}

/// Print the conflict list of a failed mutation and exit with status 1; other
/// errors propagate.
fn exit_on_conflict(result: Result<(), TimetableError>, json: bool) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(TimetableError::Conflict { message, conflicts }) => {
            eprintln!("Error: {message}");
            print_conflicts(&conflicts, 0, json)?;
            process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn print_conflicts(conflicts: &[Conflict], slot_count: usize, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(conflicts)?);
        return Ok(());
    }
    if conflicts.is_empty() {
        println!("No conflicts in {slot_count} slots");
        return Ok(());
    }
    let noun = if conflicts.len() == 1 { "conflict" } else { "conflicts" };
    println!("{} {noun}", conflicts.len());
    for c in conflicts {
        println!("[{}] {} ({} min overlap)", c.kind, c.message, c.overlap_minutes);
    }
    Ok(())
}

fn print_free_windows(
    windows: &[FreeWindow],
    resource: &Resource,
    date: NaiveDate,
    json: bool,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(windows)?);
        return Ok(());
    }
    if windows.is_empty() {
        println!("No free window for {resource} on {date}");
        return Ok(());
    }
    for w in windows {
        println!(
            "{}-{}  ({} min)",
            w.start.format("%H:%M"),
            w.end.format("%H:%M"),
            w.duration_minutes
        );
    }
    Ok(())
}

fn print_summary(summary: &TimetableSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }
    println!("Assessment {} ({})", summary.assessment_id, summary.status);
    println!(
        "  Slots:        {} on {} dates",
        summary.slot_count,
        summary.dates.len()
    );
    println!("  Rooms:        {}", summary.room_count);
    println!("  Batches:      {}", summary.batch_count);
    println!("  Unstaffed:    {}", summary.unstaffed_slots);
    println!(
        "  Conflicts:    {} (room {}, batch {}, faculty {})",
        summary.conflict_count(),
        summary.room_conflicts,
        summary.batch_conflicts,
        summary.faculty_conflicts
    );
    println!(
        "  Publishable:  {}",
        if summary.publishable { "yes" } else { "no" }
    );
    Ok(())
}

async fn write_snapshot(path: Option<&str>, store: &InMemoryStore) -> Result<()> {
    let snapshot = store.snapshot().await;
    let mut content = serde_json::to_string_pretty(&snapshot)?;
    content.push('\n');
    write_output(path, &content)
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
