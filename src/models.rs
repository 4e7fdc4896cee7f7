// Data models for the task list

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Task identifier, derived from the creation time in milliseconds
pub type TaskId = i64;

/// A single to-do entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    /// ISO-8601 creation time, informational only
    pub created_at: String,
}

impl Task {
    pub fn new(id: TaskId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            created_at: iso_now(),
        }
    }
}

/// Hands out task ids that are unique for the lifetime of a store
///
/// Ids follow the wall clock in milliseconds, but never repeat or go
/// backwards: two tasks created within the same millisecond get consecutive ids.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: TaskId,
}

impl IdGenerator {
    /// Seed the generator so it never hands out an id at or below `last`
    pub fn starting_after(last: TaskId) -> Self {
        Self { last }
    }

    /// Next id at the current time; `None` once ids above `last` are exhausted
    pub fn next_id(&mut self) -> Option<TaskId> {
        self.next_at(now_ms())
    }

    pub fn next_at(&mut self, now: TaskId) -> Option<TaskId> {
        let id = now.max(self.last.checked_add(1)?);
        self.last = id;
        Some(id)
    }

    pub fn last(&self) -> TaskId {
        self.last
    }
}

/// Helper function to get current timestamp in milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current UTC time formatted like `2024-05-01T12:30:45.123Z`
pub fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
