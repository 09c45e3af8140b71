//! Task commands: add, smart-add, list, toggle, delete, city.

use anyhow::Result;
use chrono::{DateTime, Duration, Local, Utc};
use clap::Args;

use crate::{
    assist::AssistClient,
    error::LifeSyncError,
    models::{Task, TaskPriority, TaskView},
    settings::AppSettings,
    AppState,
};

const COL_ID: usize = 14;
const COL_DUE: usize = 17;
const COL_PRIORITY: usize = 8;
const COL_TITLE: usize = 40;

#[derive(Args)]
pub struct AddArgs {
    pub title: String,

    /// RFC 3339 timestamp or an offset such as +30m (default: in one hour)
    #[arg(long)]
    pub due: Option<String>,

    #[arg(short, long, default_value = "medium", value_parser = parse_priority)]
    pub priority: TaskPriority,

    #[arg(short, long)]
    pub description: Option<String>,
}

#[derive(Args)]
pub struct SmartAddArgs {
    /// e.g. "call the dentist tomorrow at 9, it's urgent"
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_priority(value: &str) -> std::result::Result<TaskPriority, String> {
    TaskPriority::parse(value).ok_or_else(|| format!("'{value}' is not one of low, medium, high"))
}

pub async fn run_add(state: &AppState, args: AddArgs) -> Result<()> {
    let now = Utc::now();
    let due = match args.due.as_deref() {
        Some(raw) => super::parse_due(raw, now)?,
        None => now + Duration::hours(1),
    };

    let task = Task::new(&args.title, args.description, due, args.priority, now)?;
    let summary = format!("Added {} \"{}\" due {}", task.id, task.title, format_due(task.due_date));
    state.sync.add(task).await?;
    println!("{summary}");
    Ok(())
}

pub async fn run_smart_add(
    state: &AppState,
    settings: &AppSettings,
    args: SmartAddArgs,
) -> Result<()> {
    let text = args.text.join(" ");
    let client = AssistClient::new(&settings.assist)?;
    let now = Utc::now();

    let parsed = client
        .parse_task(&text, now)
        .await
        .ok_or(LifeSyncError::Parse)?;
    let task = parsed.into_task(now).map_err(|_| LifeSyncError::Parse)?;

    let summary = format!(
        "Added {} \"{}\" [{}] due {}",
        task.id,
        task.title,
        task.priority.as_str(),
        format_due(task.due_date)
    );
    state.sync.add(task).await?;
    println!("{summary}");
    Ok(())
}

pub async fn run_list(state: &AppState, args: ListArgs) -> Result<()> {
    let view = state.sync.view().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    if view.is_empty() {
        println!("No tasks yet. Add one with `lifesync add`.");
        return Ok(());
    }

    print_section("Pending", &view.pending);
    print_section("Completed", &view.completed);
    print_next_up(&view);
    Ok(())
}

pub async fn run_toggle(state: &AppState, identifier: &str) -> Result<()> {
    let tasks = state.sync.tasks().await;
    let task = super::resolve_task(identifier, &tasks)?;

    if state.sync.toggle_complete(&task.id).await? {
        let verb = if task.is_completed { "Reopened" } else { "Completed" };
        println!("{verb} \"{}\"", task.title);
    }
    Ok(())
}

pub async fn run_delete(state: &AppState, identifier: &str) -> Result<()> {
    let tasks = state.sync.tasks().await;
    let task = super::resolve_task(identifier, &tasks)?;

    if state.sync.delete(&task.id).await? {
        println!("Deleted \"{}\"", task.title);
    }
    Ok(())
}

pub async fn run_city(settings: &AppSettings, query: &str) -> Result<()> {
    let client = AssistClient::new(&settings.assist)?;
    match client.resolve_city(query).await {
        Some(city) => println!("{} ({})", city.name, city.time_zone),
        None => println!("Could not find a time zone for \"{}\"", query.trim()),
    }
    Ok(())
}

fn print_section(heading: &str, tasks: &[Task]) {
    if tasks.is_empty() {
        return;
    }

    println!("{heading} ({})", tasks.len());
    println!(
        "  {:<width_id$} {:<width_due$} {:<width_priority$} TITLE",
        "ID",
        "DUE",
        "PRIORITY",
        width_id = COL_ID,
        width_due = COL_DUE,
        width_priority = COL_PRIORITY
    );
    for task in tasks {
        let marker = if task.notified && !task.is_completed { " *" } else { "" };
        println!(
            "  {:<width_id$} {:<width_due$} {:<width_priority$} {}{marker}",
            task.id.as_str(),
            format_due(task.due_date),
            task.priority.as_str(),
            super::truncate(&task.title, COL_TITLE),
            width_id = COL_ID,
            width_due = COL_DUE,
            width_priority = COL_PRIORITY
        );
    }
    println!();
}

fn print_next_up(view: &TaskView) {
    if let Some(next) = view.next_up() {
        println!("Next up: {} ({})", next.title, format_due(next.due_date));
    }
}

fn format_due(due: DateTime<Utc>) -> String {
    due.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
