//! Presentation ordering. Recomputed from the task list on every render and
//! never stored.

use serde::Serialize;

use super::task::Task;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub pending: Vec<Task>,
    pub completed: Vec<Task>,
}

impl TaskView {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut sorted = tasks.to_vec();
        // `sort_by_key` is stable, so equal due dates keep insertion order.
        sorted.sort_by_key(|task| task.due_date);

        let (completed, pending): (Vec<Task>, Vec<Task>) =
            sorted.into_iter().partition(|task| task.is_completed);
        Self { pending, completed }
    }

    pub fn next_up(&self) -> Option<&Task> {
        self.pending.first()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.completed.is_empty()
    }
}
