//! Command-line front end for the deadline tracker.
//!
//! # Responsibility
//! - Parse one command per invocation and call into `deadline_core`.
//! - Turn store outcomes into short console messages.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, Subcommand};
use deadline_core::db::open_db;
use deadline_core::{
    default_log_level, init_logging, Deadline, DeadlineId, DeadlineService, DeadlineStore,
    LogLevel, NewDeadline, NotificationEngine, NotificationReport, Priority, SqliteDeadlineStore,
    DEFAULT_NOTIFY_DAYS,
};
use std::path::PathBuf;

/// Deadline reminder and tracking
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(long, default_value = "deadlines.db")]
    db: PathBuf,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, value_parser = parse_log_level)]
    log_level: Option<LogLevel>,

    /// Print records as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a new deadline
    Add {
        title: String,
        /// Due date as YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS]
        #[arg(value_parser = parse_due_date)]
        due: NaiveDateTime,
        /// Priority 1-4 or LOW|MEDIUM|HIGH|URGENT
        #[arg(short, long, default_value = "2")]
        priority: Priority,
        #[arg(short, long)]
        category: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// List deadlines by due date
    List {
        /// Include completed deadlines
        #[arg(long)]
        all: bool,
    },
    /// List deadlines due within the next few days
    Upcoming {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// List and mark overdue deadlines
    Overdue,
    /// Show one deadline
    Show { id: DeadlineId },
    /// Set the status (Pending, "In Progress", Completed, Overdue)
    #[command(name = "status")]
    SetStatus { id: DeadlineId, status: String },
    /// Set the priority level (1-4)
    #[command(name = "priority")]
    SetPriority { id: DeadlineId, level: i64 },
    /// Permanently delete a deadline
    Delete { id: DeadlineId },
    /// Summarize overdue and upcoming deadlines
    Notify {
        #[arg(long, default_value_t = DEFAULT_NOTIFY_DAYS)]
        days: u32,
    },
    /// Load sample deadlines for testing
    Seed,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(log_dir) = args.log_dir.as_ref() {
        let level = args.log_level.unwrap_or_else(default_log_level);
        init_logging(level, log_dir)
            .map_err(|err| anyhow!("failed to initialize logging: {err}"))?;
    }

    let conn = open_db(&args.db)
        .with_context(|| format!("failed to open database `{}`", args.db.display()))?;
    let store = SqliteDeadlineStore::try_new(&conn)?;
    let service = DeadlineService::new(&store);

    match args.command {
        Command::Add {
            title,
            due,
            priority,
            category,
            description,
        } => {
            let request = NewDeadline::new(title.trim(), due, priority, category.trim())
                .with_description(description.trim());
            let id = service.create_deadline(&request)?;
            println!("Added deadline '{}' (ID: {id})", request.title);
        }
        Command::List { all } => {
            print_deadlines(&store.list(all)?, "deadlines", store.now(), args.json)?;
        }
        Command::Upcoming { days } => {
            let label = format!("deadlines due in the next {days} days");
            print_deadlines(&store.list_upcoming(days)?, &label, store.now(), args.json)?;
        }
        Command::Overdue => {
            print_deadlines(&store.list_overdue()?, "overdue deadlines", store.now(), args.json)?;
        }
        Command::Show { id } => match store.get(id)? {
            Some(deadline) => print_deadlines(&[deadline], "deadlines", store.now(), args.json)?,
            None => bail!("deadline {id} not found"),
        },
        Command::SetStatus { id, status } => {
            if !service.update_status_named(id, &status)? {
                bail!("deadline {id} not found");
            }
            println!("Status updated for deadline {id}");
        }
        Command::SetPriority { id, level } => {
            if !service.update_priority_level(id, level)? {
                bail!("deadline {id} not found");
            }
            println!("Priority updated for deadline {id}");
        }
        Command::Delete { id } => {
            if !store.delete(id)? {
                bail!("deadline {id} not found");
            }
            println!("Deadline {id} deleted");
        }
        Command::Notify { days } => {
            let report = NotificationEngine::new(&store).check(days)?;
            print_report(&report, args.json)?;
        }
        Command::Seed => {
            let ids = service.seed_samples()?;
            println!("Added {} sample deadlines", ids.len());
        }
    }

    Ok(())
}

fn parse_log_level(value: &str) -> Result<LogLevel, String> {
    value.parse::<LogLevel>().map_err(|err| err.to_string())
}

fn parse_due_date(value: &str) -> Result<NaiveDateTime, String> {
    let value = value.trim();
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| format!("invalid due date `{value}`; expected YYYY-MM-DD[THH:MM[:SS]]"))
}

fn print_deadlines(
    deadlines: &[Deadline],
    label: &str,
    now: NaiveDateTime,
    json: bool,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(deadlines)?);
        return Ok(());
    }
    if deadlines.is_empty() {
        println!("No {label} found.");
        return Ok(());
    }
    for deadline in deadlines {
        println!("{}", describe(deadline, now));
    }
    Ok(())
}

fn describe(deadline: &Deadline, now: NaiveDateTime) -> String {
    let days = deadline.days_until(now);
    let timing = if days < 0 {
        format!("overdue {}d", -days)
    } else {
        format!("in {days}d")
    };
    format!(
        "{:>4}  {:<6}  {}  {:<11}  {:<10}  {}  ({timing})",
        deadline.id,
        deadline.priority,
        deadline.due_date.format("%m/%d/%Y"),
        deadline.status,
        deadline.category,
        deadline.title,
    )
}

fn print_report(report: &NotificationReport, json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({
            "checked_at": report.checked_at,
            "days_ahead": report.days_ahead,
            "overdue": report.overdue,
            "upcoming": report.upcoming,
            "urgent": report.urgent_upcoming().map(|d| d.id).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if report.is_all_clear() {
        println!("No urgent notifications. You're all caught up.");
        return Ok(());
    }
    if !report.overdue.is_empty() {
        println!("Overdue ({}):", report.overdue.len());
        for deadline in &report.overdue {
            println!(
                "  '{}' - {} days overdue",
                deadline.title,
                report.days_overdue(deadline)
            );
        }
    }
    if !report.upcoming.is_empty() {
        println!(
            "Upcoming ({} in next {} days):",
            report.upcoming.len(),
            report.days_ahead
        );
        for deadline in &report.upcoming {
            println!(
                "  '{}' - due in {} days ({})",
                deadline.title,
                report.days_until(deadline),
                deadline.due_date.format("%m/%d/%Y")
            );
        }
    }
    let urgent: Vec<&Deadline> = report.urgent_upcoming().collect();
    if !urgent.is_empty() {
        println!("Urgent ({}):", urgent.len());
        for deadline in urgent {
            println!("  [{}] '{}'", deadline.priority, deadline.title);
        }
    }
    Ok(())
}
