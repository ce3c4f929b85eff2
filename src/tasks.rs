//! In-memory task store.
//!
//! The store lives for the lifetime of the server process and is owned by
//! the dispatcher. Tasks are kept in insertion order and are never removed.
//! Identifiers come from a counter that only moves forward, so an ID is
//! never handed out twice.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::DispatchError;

/// A single task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    /// Unique identifier, assigned at creation.
    pub id: u64,
    /// Short title.
    pub title: String,
    /// Optional longer description.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Completion status.
    pub completed: bool,
    /// Creation time.
    pub created: DateTime<Utc>,
}

/// What [`TaskStore::complete`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The task was pending and is now complete.
    Completed,
    /// The task was already complete; nothing changed.
    AlreadyCompleted,
}

/// Ordered, append-only collection of tasks.
#[derive(Debug)]
pub struct TaskStore {
    tasks: Vec<Task>,
    next_id: u64,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// Creates an empty store. The first task gets ID 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
        }
    }

    /// Creates a store preloaded with the three sample tasks.
    #[must_use]
    pub fn with_sample_tasks() -> Self {
        // 2025-08-15 and 2025-08-14, midnight UTC
        let aug_15 = DateTime::from_timestamp(1_755_216_000, 0).unwrap_or_default();
        let aug_14 = DateTime::from_timestamp(1_755_129_600, 0).unwrap_or_default();

        let mut store = Self::new();
        store.push("Learn MCP basics", "", aug_15);
        store.push("Build a simple tool", "", aug_14).completed = true;
        store.push("Understand resources", "", aug_15);
        store
    }

    /// Appends a pending task created now and returns it.
    pub fn add(&mut self, title: &str, description: &str) -> &Task {
        self.add_at(title, description, Utc::now())
    }

    /// Appends a pending task with an explicit creation time.
    pub fn add_at(&mut self, title: &str, description: &str, created: DateTime<Utc>) -> &Task {
        self.push(title, description, created)
    }

    fn push(&mut self, title: &str, description: &str, created: DateTime<Utc>) -> &mut Task {
        let id = self.next_id;
        self.next_id += 1;

        self.tasks.push(Task {
            id,
            title: title.to_string(),
            description: description.to_string(),
            completed: false,
            created,
        });

        tracing::debug!(task_id = id, "Task stored");
        let last = self.tasks.len() - 1;
        &mut self.tasks[last]
    }

    /// Marks a task complete.
    ///
    /// Completing a task twice is not an error; the second call reports
    /// [`Completion::AlreadyCompleted`] and leaves the task unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::TaskNotFound`] if no task has this ID,
    /// which includes every negative ID.
    pub fn complete(&mut self, id: i64) -> Result<(&Task, Completion), DispatchError> {
        let wanted = u64::try_from(id).map_err(|_| DispatchError::TaskNotFound { id })?;
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == wanted)
            .ok_or(DispatchError::TaskNotFound { id })?;

        let outcome = if task.completed {
            Completion::AlreadyCompleted
        } else {
            task.completed = true;
            Completion::Completed
        };

        Ok((&*task, outcome))
    }

    /// Looks up a task by ID.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// All tasks, in insertion order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Tasks that are not yet complete, in insertion order.
    pub fn pending(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| !t.completed)
    }

    /// Number of completed tasks.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// Number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let store = TaskStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let mut store = TaskStore::new();
        let a = store.add("one", "").id;
        let b = store.add("two", "").id;
        let c = store.add("three", "details").id;

        assert_eq!((a, b, c), (1, 2, 3));
        assert_eq!(store.len(), 3);
        assert!(store.tasks().iter().all(|t| !t.completed));
        assert_eq!(store.get(3).unwrap().description, "details");
    }

    #[test]
    fn insertion_order_is_kept() {
        let mut store = TaskStore::new();
        store.add("b", "");
        store.add("a", "");
        let titles: Vec<&str> = store.tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["b", "a"]);
    }

    #[test]
    fn complete_unknown_id() {
        let mut store = TaskStore::new();
        store.add("only", "");
        let err = store.complete(99).unwrap_err();
        assert!(matches!(err, DispatchError::TaskNotFound { id: 99 }));

        let err = store.complete(-1).unwrap_err();
        assert!(matches!(err, DispatchError::TaskNotFound { id: -1 }));
        assert_eq!(err.to_string(), "Task with ID -1 not found.");
    }

    #[test]
    fn complete_is_idempotent() {
        let mut store = TaskStore::new();
        store.add("finish me", "");

        let (task, first) = store.complete(1).unwrap();
        assert!(task.completed);
        assert_eq!(first, Completion::Completed);

        let (task, second) = store.complete(1).unwrap();
        assert!(task.completed);
        assert_eq!(second, Completion::AlreadyCompleted);
        assert_eq!(store.completed_count(), 1);
    }

    #[test]
    fn sample_tasks() {
        let mut store = TaskStore::with_sample_tasks();
        assert_eq!(store.len(), 3);
        assert_eq!(store.completed_count(), 1);
        assert!(store.get(2).unwrap().completed);
        assert_eq!(
            store.get(2).unwrap().created.format("%Y-%m-%d").to_string(),
            "2025-08-14"
        );
        assert_eq!(store.pending().count(), 2);
        assert_eq!(store.add("next", "").id, 4);
    }

    #[test]
    fn serialises_without_empty_description() {
        let mut store = TaskStore::new();
        store.add("plain", "");
        let json = serde_json::to_value(store.tasks()).unwrap();
        assert!(json[0].get("description").is_none());
        assert_eq!(json[0]["completed"], false);
    }
}
