// Task store: the ordered task sequence, its filter, and persistence

use crate::filter::FilterMode;
use crate::models::{IdGenerator, Task, TaskId, now_ms};
use crate::storage::Storage;
use eyre::{Context, Result, eyre};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Storage key holding the serialized task list
pub const STORAGE_KEY: &str = "todoTasks";

/// Aggregate counts over the full, unfiltered task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

/// What a mutation did to the task list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// A new task was prepended
    Added(Task),
    /// A task's completion flag was flipped; carries the updated task
    Toggled(Task),
    /// A task was removed; carries the removed task
    Deleted(Task),
    /// Add was called with blank text
    EmptyText,
    /// No task has this id
    NotFound(TaskId),
}

impl Mutation {
    /// True when the task list changed
    pub fn changed(&self) -> bool {
        matches!(self, Mutation::Added(_) | Mutation::Toggled(_) | Mutation::Deleted(_))
    }
}

/// Owns the task list and mirrors it to storage after every change
pub struct TaskStore<S: Storage> {
    storage: S,
    tasks: Vec<Task>,
    filter: FilterMode,
    ids: IdGenerator,
}

impl<S: Storage> TaskStore<S> {
    /// Load the task list from storage
    ///
    /// Never fails: a missing, unreadable, or malformed value yields an empty
    /// list. Duplicate ids keep their first occurrence.
    pub fn load(storage: S) -> Self {
        let tasks = match storage.get_item(STORAGE_KEY) {
            Ok(Some(raw)) => Self::parse_tasks(&raw),
            Ok(None) => {
                debug!(key = STORAGE_KEY, "No stored tasks, starting empty");
                Vec::new()
            }
            Err(e) => {
                warn!(key = STORAGE_KEY, error = ?e, "Failed to read stored tasks, starting empty");
                Vec::new()
            }
        };

        let last_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
        info!(count = tasks.len(), "Loaded tasks");

        Self {
            storage,
            tasks,
            filter: FilterMode::default(),
            ids: IdGenerator::starting_after(last_id),
        }
    }

    fn parse_tasks(raw: &str) -> Vec<Task> {
        let parsed: Vec<Task> = match serde_json::from_str::<Option<Vec<Task>>>(raw) {
            Ok(tasks) => tasks.unwrap_or_default(),
            Err(e) => {
                warn!(key = STORAGE_KEY, error = ?e, "Stored tasks are malformed, starting empty");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let before = parsed.len();
        let tasks: Vec<Task> = parsed.into_iter().filter(|t| seen.insert(t.id)).collect();
        if tasks.len() != before {
            warn!(dropped = before - tasks.len(), "Dropped tasks with duplicate ids");
        }
        tasks
    }

    /// Write the full task list to storage
    pub fn save(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.tasks).context("Failed to serialize tasks")?;
        self.storage
            .set_item(STORAGE_KEY, &json)
            .context("Failed to persist tasks")?;
        debug!(count = self.tasks.len(), "Saved tasks");
        Ok(())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Prepend a new pending task with the trimmed text
    ///
    /// Blank text leaves the list untouched and returns `Mutation::EmptyText`.
    /// The in-memory change stands even if persisting it fails.
    pub fn add(&mut self, text: &str) -> Result<Mutation> {
        let text = text.trim();
        if text.is_empty() {
            debug!("add: rejected blank text");
            return Ok(Mutation::EmptyText);
        }

        let id = match self.ids.next_id() {
            Some(id) => id,
            None => self.unused_id(now_ms())?,
        };
        let task = Task::new(id, text);
        debug!(id = task.id, "add: prepending task");
        self.tasks.insert(0, task.clone());
        self.save()?;
        Ok(Mutation::Added(task))
    }

    /// Smallest id at or above `now` that no task uses, wrapping to the bottom of the range
    fn unused_id(&self, now: TaskId) -> Result<TaskId> {
        let used: HashSet<TaskId> = self.tasks.iter().map(|t| t.id).collect();
        warn!(now, "Task ids exhausted above the largest stored id, reusing a gap");
        (now..=TaskId::MAX)
            .chain(TaskId::MIN..now)
            .find(|id| !used.contains(id))
            .ok_or_else(|| eyre!("No unused task ids left"))
    }

    /// Flip the completion flag of the task with this id
    pub fn toggle(&mut self, id: TaskId) -> Result<Mutation> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id, "toggle: no such task");
            return Ok(Mutation::NotFound(id));
        };

        task.completed = !task.completed;
        let task = task.clone();
        debug!(id, completed = task.completed, "toggle: flipped");
        self.save()?;
        Ok(Mutation::Toggled(task))
    }

    /// Remove the task with this id; confirmation is the caller's concern
    pub fn delete(&mut self, id: TaskId) -> Result<Mutation> {
        let Some(index) = self.tasks.iter().position(|t| t.id == id) else {
            debug!(id, "delete: no such task");
            return Ok(Mutation::NotFound(id));
        };

        let task = self.tasks.remove(index);
        debug!(id, "delete: removed");
        self.save()?;
        Ok(Mutation::Deleted(task))
    }

    /// Change the visible subset; not persisted
    pub fn set_filter(&mut self, filter: FilterMode) {
        debug!(%filter, "set_filter");
        self.filter = filter;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    /// Every task, newest first
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks visible under the current filter, in stored order
    pub fn filtered(&self) -> Vec<&Task> {
        self.filtered_by(self.filter)
    }

    pub fn filtered_by(&self, filter: FilterMode) -> Vec<&Task> {
        self.tasks.iter().filter(|t| filter.matches(t)).collect()
    }

    /// Counts over all tasks, ignoring the current filter
    pub fn stats(&self) -> Stats {
        let total = self.tasks.len();
        let completed = self.tasks.iter().filter(|t| t.completed).count();
        Stats {
            total,
            completed,
            pending: total - completed,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}
