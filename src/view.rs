// Derived presentation of the task list and its renderers

use crate::filter::FilterMode;
use crate::models::{Task, TaskId};
use crate::notify::{LiveNotification, Phase, Severity};
use crate::store::Stats;
use colored::*;
use std::fmt::Write;

/// Placeholder shown when the filtered list is empty
pub const EMPTY_STATE: &str = "No tasks yet. Add one above to get started!";

/// One display row, correlated to its task by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: TaskId,
    /// Raw task text; renderers escape it for their medium
    pub text: String,
    pub completed: bool,
    /// Delete was requested and awaits confirmation
    pub confirming_delete: bool,
}

impl Row {
    pub fn from_task(task: &Task, pending_delete: Option<TaskId>) -> Self {
        Self {
            id: task.id,
            text: task.text.clone(),
            completed: task.completed,
            confirming_delete: pending_delete == Some(task.id),
        }
    }
}

/// Everything a front-end needs to draw one frame, rebuilt from scratch each time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub rows: Vec<Row>,
    pub filter: FilterMode,
    pub stats: Stats,
    pub input: String,
    pub pending_delete: Option<TaskId>,
    pub notifications: Vec<LiveNotification>,
}

impl View {
    /// True when the empty-state placeholder replaces the list
    pub fn shows_empty_state(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Escape text so it is displayed literally inside HTML
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the view as an HTML fragment
pub fn render_html(view: &View) -> String {
    let mut html = String::new();

    html.push_str("<div class=\"todo-app\">\n");

    html.push_str("  <div class=\"filters\">\n");
    for mode in FilterMode::ALL {
        let active = if mode == view.filter { " active" } else { "" };
        let _ = writeln!(
            html,
            "    <button class=\"filter-btn{}\" data-filter=\"{}\">{}</button>",
            active,
            mode,
            capitalize(mode.as_str())
        );
    }
    html.push_str("  </div>\n");

    html.push_str("  <div class=\"stats\">\n");
    let _ = writeln!(html, "    <span id=\"totalTasks\">{}</span>", view.stats.total);
    let _ = writeln!(html, "    <span id=\"completedTasks\">{}</span>", view.stats.completed);
    let _ = writeln!(html, "    <span id=\"pendingTasks\">{}</span>", view.stats.pending);
    html.push_str("  </div>\n");

    html.push_str("  <div id=\"todoList\">\n");
    if view.shows_empty_state() {
        let _ = writeln!(html, "    <div id=\"emptyState\">{}</div>", escape_html(EMPTY_STATE));
    } else {
        for row in &view.rows {
            let done = if row.completed { " completed" } else { "" };
            let checked = if row.completed { " checked" } else { "" };
            let _ = writeln!(html, "    <div class=\"todo-item{}\" data-id=\"{}\">", done, row.id);
            let _ = writeln!(
                html,
                "      <div class=\"todo-checkbox{}\" data-action=\"toggle\" data-id=\"{}\"></div>",
                checked, row.id
            );
            let _ = writeln!(
                html,
                "      <span class=\"todo-text{}\">{}</span>",
                done,
                escape_html(&row.text)
            );
            let label = if row.confirming_delete { "Confirm delete" } else { "Delete" };
            let _ = writeln!(
                html,
                "      <button class=\"delete-btn\" data-action=\"delete\" data-id=\"{}\">{}</button>",
                row.id, label
            );
            html.push_str("    </div>\n");
        }
    }
    html.push_str("  </div>\n");

    for n in &view.notifications {
        let _ = writeln!(
            html,
            "  <div class=\"notification {} {}\" style=\"background: {};\">{}</div>",
            n.severity.as_str(),
            phase_class(n.phase),
            n.severity.color(),
            escape_html(&n.message)
        );
    }

    html.push_str("</div>\n");
    html
}

/// Render the view for a terminal
pub fn render_text(view: &View) -> String {
    render_text_with(view, false)
}

/// Render for a terminal, optionally prefixing rows with their `#N` position
pub fn render_text_with(view: &View, row_numbers: bool) -> String {
    let mut out = String::new();

    let filters: Vec<String> = FilterMode::ALL
        .iter()
        .map(|mode| {
            if *mode == view.filter {
                format!("[{}]", mode).bold().to_string()
            } else {
                mode.to_string().dimmed().to_string()
            }
        })
        .collect();
    let _ = writeln!(out, "Filter: {}", filters.join(" "));

    if view.shows_empty_state() {
        let _ = writeln!(out, "  {}", EMPTY_STATE.dimmed());
    } else {
        for (index, row) in view.rows.iter().enumerate() {
            if row_numbers {
                let _ = write!(out, "{}", format!("#{:<3}", index + 1).dimmed());
            }
            let checkbox = if row.completed { "[x]".green() } else { "[ ]".normal() };
            let text = if row.completed {
                row.text.strikethrough().dimmed()
            } else {
                row.text.normal()
            };
            let _ = write!(out, "  {} {} {}", checkbox, row.id.to_string().cyan(), text);
            if row.confirming_delete {
                let _ = write!(out, "  {}", "(delete? yes/no)".yellow());
            }
            out.push('\n');
        }
    }

    let _ = writeln!(
        out,
        "Total: {}  Completed: {}  Pending: {}",
        view.stats.total.to_string().bold(),
        view.stats.completed.to_string().green(),
        view.stats.pending.to_string().yellow()
    );

    out.push_str(&render_notifications(&view.notifications));
    out
}

/// One coloured line per live notification
pub fn render_notifications(notifications: &[LiveNotification]) -> String {
    let mut out = String::new();
    for n in notifications {
        let message = match n.severity {
            Severity::Success => n.message.green(),
            Severity::Error => n.message.red(),
        };
        let _ = writeln!(out, "{} {}", "»".dimmed(), message);
    }
    out
}

fn phase_class(phase: Phase) -> &'static str {
    match phase {
        Phase::Entering => "entering",
        Phase::Visible => "visible",
        Phase::Exiting => "exiting",
        Phase::Removed => "removed",
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
