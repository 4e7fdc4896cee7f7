// tasklist - Task list with key-value persistence, filtered views and transient notifications

pub mod app;
pub mod cli;
pub mod config;
pub mod filter;
pub mod models;
pub mod notify;
pub mod shell;
pub mod storage;
pub mod store;
pub mod view;

// Re-export main types for convenience
pub use app::{Action, App};
pub use config::Config;
pub use filter::FilterMode;
pub use models::{IdGenerator, Task, TaskId, now_ms};
pub use notify::{NotificationCenter, Phase, Severity};
pub use storage::{Backend, FileStorage, MemoryStorage, SqliteStorage, Storage, open_storage};
pub use store::{Mutation, STORAGE_KEY, Stats, TaskStore};
pub use view::{Row, View, escape_html, render_html, render_text};
