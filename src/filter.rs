// Filter modes for the visible task list

use crate::models::Task;
use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which tasks are visible. Never affects which tasks are counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    All,
    Completed,
    Pending,
}

impl FilterMode {
    pub const ALL: [FilterMode; 3] = [FilterMode::All, FilterMode::Completed, FilterMode::Pending];

    pub fn matches(self, task: &Task) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Completed => task.completed,
            FilterMode::Pending => !task.completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterMode::All => "all",
            FilterMode::Completed => "completed",
            FilterMode::Pending => "pending",
        }
    }
}

impl FromStr for FilterMode {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(FilterMode::All),
            "completed" | "done" => Ok(FilterMode::Completed),
            "pending" | "active" => Ok(FilterMode::Pending),
            other => Err(eyre!("Unknown filter: {} (expected all, completed or pending)", other)),
        }
    }
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
