//! Application view-model
//!
//! `App` owns the task store plus the UI-only state around it: the input
//! field, the task awaiting delete confirmation, and the notifications on
//! screen. Front-ends translate user input into [`Action`]s and draw whatever
//! [`App::view`] returns.

use crate::filter::FilterMode;
use crate::models::TaskId;
use crate::notify::{NotificationCenter, Severity};
use crate::storage::Storage;
use crate::store::{Mutation, TaskStore};
use crate::view::{Row, View};
use std::time::Instant;
use tracing::{debug, warn};

pub const MSG_EMPTY_TEXT: &str = "Please enter a task!";
pub const MSG_ADDED: &str = "Task added successfully!";
pub const MSG_COMPLETED: &str = "Task completed! 🎉";
pub const MSG_PENDING: &str = "Task marked as pending";
pub const MSG_DELETED: &str = "Task deleted";
pub const MSG_SAVE_FAILED: &str = "Failed to save tasks";

/// A discrete user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Replace the contents of the input field
    SetInput(String),
    /// Add a task from the input field
    Submit,
    Toggle(TaskId),
    /// First step of deleting: ask for confirmation
    RequestDelete(TaskId),
    ConfirmDelete,
    CancelDelete,
    SetFilter(FilterMode),
}

pub struct App<S: Storage> {
    store: TaskStore<S>,
    input: String,
    pending_delete: Option<TaskId>,
    notifications: NotificationCenter,
}

impl<S: Storage> App<S> {
    pub fn new(store: TaskStore<S>) -> Self {
        Self::with_notifications(store, NotificationCenter::default())
    }

    pub fn with_notifications(store: TaskStore<S>, notifications: NotificationCenter) -> Self {
        Self {
            store,
            input: String::new(),
            pending_delete: None,
            notifications,
        }
    }

    /// Apply one user action at time `now`
    pub fn dispatch(&mut self, action: Action, now: Instant) {
        debug!(?action, "dispatch");
        match action {
            Action::SetInput(text) => self.input = text,
            Action::Submit => {
                let text = std::mem::take(&mut self.input);
                let result = self.store.add(&text);
                if matches!(result, Ok(Mutation::EmptyText)) {
                    self.input = text;
                }
                self.report(result, now);
            }
            Action::Toggle(id) => {
                let result = self.store.toggle(id);
                self.report(result, now);
            }
            Action::RequestDelete(id) => {
                if self.store.get(id).is_some() {
                    self.pending_delete = Some(id);
                } else {
                    debug!(id, "delete requested for unknown task");
                }
            }
            Action::ConfirmDelete => {
                if let Some(id) = self.pending_delete.take() {
                    let result = self.store.delete(id);
                    self.report(result, now);
                }
            }
            Action::CancelDelete => {
                self.pending_delete = None;
            }
            Action::SetFilter(filter) => self.store.set_filter(filter),
        }
    }

    fn report(&mut self, result: eyre::Result<Mutation>, now: Instant) {
        match result {
            Ok(Mutation::Added(_)) => {
                self.notifications.show(MSG_ADDED, Severity::Success, now);
            }
            Ok(Mutation::Toggled(task)) => {
                let message = if task.completed { MSG_COMPLETED } else { MSG_PENDING };
                self.notifications.show(message, Severity::Success, now);
            }
            Ok(Mutation::Deleted(_)) => {
                self.notifications.show(MSG_DELETED, Severity::Success, now);
            }
            Ok(Mutation::EmptyText) => {
                self.notifications.show(MSG_EMPTY_TEXT, Severity::Error, now);
            }
            Ok(Mutation::NotFound(_)) => {}
            Err(e) => {
                warn!(error = ?e, "Failed to persist tasks");
                self.notifications.show(MSG_SAVE_FAILED, Severity::Error, now);
            }
        }
    }

    /// Let notification timers run up to `now`
    pub fn tick(&mut self, now: Instant) {
        self.notifications.tick(now);
    }

    /// Derive the full frame from current state
    pub fn view(&self, now: Instant) -> View {
        View {
            rows: self
                .store
                .filtered()
                .into_iter()
                .map(|task| Row::from_task(task, self.pending_delete))
                .collect(),
            filter: self.store.filter(),
            stats: self.store.stats(),
            input: self.input.clone(),
            pending_delete: self.pending_delete,
            notifications: self.notifications.live(now),
        }
    }

    pub fn store(&self) -> &TaskStore<S> {
        &self.store
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn pending_delete(&self) -> Option<TaskId> {
        self.pending_delete
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }
}
