//! CLI argument parsing for tasklist

use crate::filter::FilterMode;
use crate::models::TaskId;
use crate::storage::Backend;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tasklist")]
#[command(about = "Add, complete, delete and filter short text tasks")]
#[command(version = env!("GIT_DESCRIBE"))]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the task storage (overrides config)
    #[arg(short, long, global = true)]
    pub store_path: Option<PathBuf>,

    /// Storage backend (overrides config)
    #[arg(short, long, value_enum, global = true)]
    pub backend: Option<Backend>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    Add {
        /// Task text; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Mark a task completed, or pending again
    Toggle {
        /// Task ID
        id: TaskId,
    },

    /// Delete a task
    Delete {
        /// Task ID
        id: TaskId,

        /// Confirm the deletion
        #[arg(short, long)]
        yes: bool,
    },

    /// List tasks
    List {
        /// Which tasks to show (default from config)
        #[arg(short, long, value_enum)]
        filter: Option<FilterMode>,
    },

    /// Show total, completed and pending counts
    Stats,

    /// Write the task list as an HTML fragment
    Export {
        /// Which tasks to include (default from config)
        #[arg(short, long, value_enum)]
        filter: Option<FilterMode>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start an interactive session
    Shell,
}
