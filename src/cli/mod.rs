//! Command line surface.

pub mod account;
pub mod notifications;
pub mod tasks;
pub mod watch;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use clap::{Parser, Subcommand};

use crate::models::Task;

pub use notifications::NotificationCommands;
pub use tasks::{AddArgs, ListArgs, SmartAddArgs};

#[derive(Parser)]
#[command(name = "lifesync", version, about = "Tasks that follow you between devices")]
pub struct Cli {
    /// Directory holding the local store, the simulated cloud and settings
    #[arg(long, global = true, env = "LIFESYNC_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task
    Add(AddArgs),

    /// Describe a task in plain language and let the assistant fill it in
    SmartAdd(SmartAddArgs),

    /// Show pending and completed tasks
    List(ListArgs),

    /// Mark a task done, or reopen it
    Toggle { id: String },

    /// Delete a task
    Delete { id: String },

    /// Log in with an email address and pull the cloud copy
    Login { email: String },

    /// Log out; local tasks are kept
    Logout,

    /// Show the session and sync status
    Status,

    /// Pull the cloud copy again
    Pull,

    /// Stay running: scan for due tasks and push edits as they happen
    Watch,

    /// Manage due-task notifications
    Notifications {
        #[command(subcommand)]
        command: NotificationCommands,
    },

    /// Look up the time zone of a city
    City { query: String },
}

/// Accepts RFC 3339 timestamps, `now`, or offsets such as `+30m`, `+2h`,
/// `+1d`, `-45s`.
pub fn parse_due(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("now") {
        return Ok(now);
    }

    if let Some(sign) = input.chars().next().filter(|c| *c == '+' || *c == '-') {
        let body = &input[1..];
        let split = body
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(body.len());
        let (amount, unit) = body.split_at(split);
        let amount: i64 = amount
            .parse()
            .with_context(|| format!("invalid offset '{input}'"))?;

        let offset = match unit {
            "s" => TimeDelta::try_seconds(amount),
            "m" | "" => TimeDelta::try_minutes(amount),
            "h" => TimeDelta::try_hours(amount),
            "d" => TimeDelta::try_days(amount),
            other => bail!("unknown time unit '{other}' in '{input}'"),
        };
        let due = offset.and_then(|offset| {
            if sign == '+' {
                now.checked_add_signed(offset)
            } else {
                now.checked_sub_signed(offset)
            }
        });
        return due.with_context(|| format!("offset '{input}' is out of range"));
    }

    DateTime::parse_from_rfc3339(input)
        .map(|due| due.with_timezone(&Utc))
        .with_context(|| format!("'{input}' is neither RFC 3339 nor an offset like +30m"))
}

/// Finds a task by exact id, then by unique id prefix.
pub fn resolve_task<'a>(identifier: &str, tasks: &'a [Task]) -> Result<&'a Task> {
    if let Some(task) = tasks.iter().find(|t| t.id.as_str() == identifier) {
        return Ok(task);
    }

    let mut matches = tasks.iter().filter(|t| t.id.as_str().starts_with(identifier));
    match (matches.next(), matches.next()) {
        (Some(task), None) => Ok(task),
        (Some(_), Some(_)) => bail!("'{identifier}' matches more than one task"),
        (None, _) => bail!("Task not found: {identifier}"),
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else if max <= 3 {
        s.chars().take(max).collect()
    } else {
        let kept: String = s.chars().take(max - 3).collect();
        format!("{kept}...")
    }
}
