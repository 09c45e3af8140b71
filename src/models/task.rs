//! Task data model.
//!
//! The JSON layout is shared by the local store and the cloud buckets, so field
//! names stay camelCase and `description` is omitted when absent.

use std::{
    fmt,
    sync::atomic::{AtomicI64, Ordering},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LifeSyncError, Result};

static LAST_ISSUED_MS: AtomicI64 = AtomicI64::new(0);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Millisecond timestamp of `now`, bumped past the last issued id so
    /// that tasks created in the same millisecond still get distinct ids.
    pub fn generate(now: DateTime<Utc>) -> Self {
        let wanted = now.timestamp_millis();
        let mut last = LAST_ISSUED_MS.load(Ordering::Relaxed);
        loop {
            let next = wanted.max(last + 1);
            match LAST_ISSUED_MS.compare_exchange_weak(
                last,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Self(next.to_string()),
                Err(actual) => last = actual,
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub is_completed: bool,
    pub notified: bool,
    pub priority: TaskPriority,
}

impl Task {
    pub fn new(
        title: &str,
        description: Option<String>,
        due_date: DateTime<Utc>,
        priority: TaskPriority,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(LifeSyncError::InvalidTask("title must not be empty".into()));
        }

        let description = description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        Ok(Self {
            id: TaskId::generate(now),
            title: title.to_string(),
            description,
            due_date,
            is_completed: false,
            notified: false,
            priority,
        })
    }

    /// Due, still open, and not yet announced.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed && !self.notified && self.due_date <= now
    }

    pub fn toggle_complete(&mut self) {
        self.is_completed = !self.is_completed;
    }

    /// One-way: once set, nothing clears it.
    pub fn mark_notified(&mut self) {
        self.notified = true;
    }

    pub fn notification_title(&self) -> String {
        format!("Task Due: {}", self.title)
    }

    pub fn notification_body(&self) -> &str {
        self.description
            .as_deref()
            .filter(|text| !text.is_empty())
            .unwrap_or("This task is due now!")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_generated_ids_are_unique_within_one_millisecond() {
        let now = fixed_now();
        let first = TaskId::generate(now);
        let second = TaskId::generate(now);
        assert_ne!(first, second);

        let first_ms: i64 = first.as_str().parse().unwrap();
        let second_ms: i64 = second.as_str().parse().unwrap();
        assert!(second_ms > first_ms);
    }

    #[test]
    fn test_new_task_rejects_blank_title() {
        let result = Task::new("   ", None, fixed_now(), TaskPriority::Low, fixed_now());
        assert!(matches!(result, Err(LifeSyncError::InvalidTask(_))));
    }

    #[test]
    fn test_new_task_trims_and_drops_empty_description() {
        let task = Task::new(
            "  Buy milk ",
            Some("   ".into()),
            fixed_now(),
            TaskPriority::High,
            fixed_now(),
        )
        .unwrap();

        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, None);
        assert!(!task.is_completed);
        assert!(!task.notified);
    }

    #[test]
    fn test_is_due() {
        let now = fixed_now();
        let due = now - Duration::seconds(1);
        let mut task = Task::new("Call", None, due, TaskPriority::Medium, now).unwrap();
        assert!(task.is_due(now));

        task.toggle_complete();
        assert!(!task.is_due(now));

        task.toggle_complete();
        task.mark_notified();
        assert!(!task.is_due(now));

        let later = Task::new("Later", None, now + Duration::seconds(1000), TaskPriority::Low, now)
            .unwrap();
        assert!(!later.is_due(now));
    }

    #[test]
    fn test_json_layout_uses_camel_case() {
        let now = fixed_now();
        let task = Task {
            id: TaskId::from("1710408600000"),
            title: "Stretch".into(),
            description: None,
            due_date: now,
            is_completed: false,
            notified: true,
            priority: TaskPriority::High,
        };

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["id"], "1710408600000");
        assert_eq!(json["dueDate"], "2026-03-14T09:30:00Z");
        assert_eq!(json["isCompleted"], false);
        assert_eq!(json["notified"], true);
        assert_eq!(json["priority"], "high");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_notification_text_falls_back_to_default_body() {
        let now = fixed_now();
        let mut task = Task::new("Water plants", None, now, TaskPriority::Low, now).unwrap();
        assert_eq!(task.notification_title(), "Task Due: Water plants");
        assert_eq!(task.notification_body(), "This task is due now!");

        task.description = Some("Balcony first".into());
        assert_eq!(task.notification_body(), "Balcony first");
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!(TaskPriority::parse("HIGH"), Some(TaskPriority::High));
        assert_eq!(TaskPriority::parse(" med "), Some(TaskPriority::Medium));
        assert_eq!(TaskPriority::parse("urgent"), None);
    }
}
