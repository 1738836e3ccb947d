//! Client-side task list reconciliation.
//!
//! The UI holds one `TaskList` mirroring the most recent List response.
//! Local state is only mutated after a confirmed success, so a failed call
//! never needs a rollback — it just records a dismissible error and keeps
//! whatever was loaded before.

use crate::tasks::Task;

#[derive(Debug, Default)]
pub struct TaskList {
    tasks: Vec<Task>,
    error: Option<String>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Load: replace the entire local list with a fresh List response.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    /// Create: a newly created task is always the most recent, so
    /// prepending keeps the list recency-descending without a re-fetch.
    pub fn apply_created(&mut self, task: Task) {
        self.tasks.insert(0, task);
    }

    /// Update: replace the matching entry by id in place; other entries
    /// and order are untouched. Returns `false` when the id is unknown.
    pub fn apply_updated(&mut self, task: Task) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => {
                *slot = task;
                true
            }
            None => false,
        }
    }

    /// Delete: remove the matching entry by id. Returns `false` when the
    /// id is unknown.
    pub fn apply_deleted(&mut self, id: i64) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}
