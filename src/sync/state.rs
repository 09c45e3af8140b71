use chrono::{DateTime, Utc};

use crate::models::{Task, TaskId};

/// The canonical, insertion-ordered task list. Newest entries sit at the head.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    pub fn add(&mut self, task: Task) {
        self.tasks.insert(0, task);
    }

    /// Returns whether a task with `id` existed.
    pub fn toggle_complete(&mut self, id: &TaskId) -> bool {
        match self.tasks.iter_mut().find(|task| &task.id == id) {
            Some(task) => {
                task.toggle_complete();
                true
            }
            None => false,
        }
    }

    /// Returns whether a task with `id` existed.
    pub fn delete(&mut self, id: &TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| &task.id != id);
        self.tasks.len() != before
    }

    pub fn replace(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    /// Flags every newly due task as notified in one pass and hands back
    /// copies of exactly those tasks.
    pub fn mark_due(&mut self, now: DateTime<Utc>) -> Vec<Task> {
        let mut newly_due = Vec::new();
        for task in self.tasks.iter_mut().filter(|task| task.is_due(now)) {
            task.mark_notified();
            newly_due.push(task.clone());
        }
        newly_due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskPriority;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap()
    }

    fn task(title: &str, due_offset_secs: i64) -> Task {
        Task::new(
            title,
            None,
            now() + Duration::seconds(due_offset_secs),
            TaskPriority::Medium,
            now(),
        )
        .unwrap()
    }

    #[test]
    fn test_add_inserts_at_head() {
        let mut list = TaskList::default();
        list.add(task("first", 10));
        list.add(task("second", 10));
        assert_eq!(list.as_slice()[0].title, "second");
        assert_eq!(list.as_slice()[1].title, "first");
    }

    #[test]
    fn test_toggle_and_delete_unknown_ids_are_noops() {
        let mut list = TaskList::new(vec![task("only", 10)]);
        let missing = TaskId::from("does-not-exist");

        assert!(!list.toggle_complete(&missing));
        assert!(!list.delete(&missing));
        assert_eq!(list.len(), 1);
        assert!(!list.as_slice()[0].is_completed);
    }

    #[test]
    fn test_toggle_flips_back_and_forth() {
        let only = task("only", 10);
        let id = only.id.clone();
        let mut list = TaskList::new(vec![only]);

        assert!(list.toggle_complete(&id));
        assert!(list.get(&id).unwrap().is_completed);
        assert!(list.toggle_complete(&id));
        assert!(!list.get(&id).unwrap().is_completed);
    }

    #[test]
    fn test_mark_due_only_flags_overdue_tasks() {
        let future = task("future", 1000);
        let overdue = task("overdue", -1);
        let overdue_id = overdue.id.clone();
        let mut list = TaskList::new(vec![future, overdue]);

        let due = list.mark_due(now());
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, overdue_id);
        assert!(list.get(&overdue_id).unwrap().notified);
        assert!(!list.as_slice()[0].notified);
    }

    #[test]
    fn test_mark_due_handles_all_due_tasks_in_one_pass() {
        let mut list = TaskList::new(vec![task("a", -30), task("b", -20), task("c", 0)]);
        assert_eq!(list.mark_due(now()).len(), 3);
        assert!(list.as_slice().iter().all(|t| t.notified));
    }

    #[test]
    fn test_mark_due_is_idempotent_and_never_resets() {
        let mut list = TaskList::new(vec![task("a", -5)]);
        assert_eq!(list.mark_due(now()).len(), 1);
        assert!(list.mark_due(now() + Duration::hours(1)).is_empty());

        // Completing and reopening a task leaves the flag alone.
        let id = list.as_slice()[0].id.clone();
        list.toggle_complete(&id);
        list.toggle_complete(&id);
        assert!(list.get(&id).unwrap().notified);
        assert!(list.mark_due(now() + Duration::hours(2)).is_empty());
    }

    #[test]
    fn test_completed_tasks_are_not_notified() {
        let mut done = task("done", -5);
        done.toggle_complete();
        let mut list = TaskList::new(vec![done]);
        assert!(list.mark_due(now()).is_empty());
        assert!(!list.as_slice()[0].notified);
    }
}
