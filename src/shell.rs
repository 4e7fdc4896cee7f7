//! Interactive session over the application view-model

use crate::app::{Action, App};
use crate::filter::FilterMode;
use crate::models::TaskId;
use crate::storage::Storage;
use crate::view::{View, render_text_with};
use colored::*;
use eyre::{Context, Result, eyre};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::time::Instant;
use tracing::debug;

const HELP: &str = "\
Commands:
  add <text>       add a task            (a)
  toggle <task>    complete / reopen     (t)
  delete <task>    ask to delete         (d)
  yes | no         answer a delete prompt
  filter <mode>    all, completed, pending (f)
  list             redraw                (l)
  help             this text
  quit             leave                 (q)

<task> is a task id, or #N for the Nth row on screen.";

/// How a command names a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Id(TaskId),
    /// 1-based row on the current screen
    Row(usize),
}

/// One parsed line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Add(String),
    Toggle(Target),
    Delete(Target),
    Confirm,
    Cancel,
    Filter(FilterMode),
    Redraw,
    Help,
    Quit,
}

pub fn parse_line(line: &str) -> Result<Input> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    let input = match command.to_ascii_lowercase().as_str() {
        "" | "l" | "list" => Input::Redraw,
        // Blank text goes through so the empty-input notification fires
        "a" | "add" => Input::Add(rest.to_string()),
        "t" | "toggle" => Input::Toggle(parse_target(rest)?),
        "d" | "delete" | "rm" => Input::Delete(parse_target(rest)?),
        "y" | "yes" => Input::Confirm,
        "n" | "no" => Input::Cancel,
        "f" | "filter" => Input::Filter(rest.parse()?),
        "h" | "help" | "?" => Input::Help,
        "q" | "quit" | "exit" => Input::Quit,
        other => return Err(eyre!("Unknown command: {} (try 'help')", other)),
    };
    Ok(input)
}

fn parse_target(arg: &str) -> Result<Target> {
    if arg.is_empty() {
        return Err(eyre!("Missing task id"));
    }
    if let Some(row) = arg.strip_prefix('#') {
        let row: usize = row.parse().context(format!("Invalid row number: {}", arg))?;
        if row == 0 {
            return Err(eyre!("Rows are numbered from 1"));
        }
        return Ok(Target::Row(row));
    }
    let id: TaskId = arg.parse().context(format!("Invalid task id: {}", arg))?;
    Ok(Target::Id(id))
}

/// Resolve a target against what is on screen; unknown rows resolve to nothing
pub fn resolve(target: Target, view: &View) -> Option<TaskId> {
    match target {
        Target::Id(id) => Some(id),
        Target::Row(n) => view.rows.get(n - 1).map(|row| row.id),
    }
}

/// Translate parsed input into view-model actions
///
/// Anything other than a confirmation dismisses an open delete prompt first.
pub fn actions_for(input: &Input, view: &View) -> Vec<Action> {
    let mut actions = Vec::new();
    if view.pending_delete.is_some() && *input != Input::Confirm {
        actions.push(Action::CancelDelete);
    }

    match input {
        Input::Add(text) => {
            actions.push(Action::SetInput(text.clone()));
            actions.push(Action::Submit);
        }
        Input::Toggle(target) => {
            if let Some(id) = resolve(*target, view) {
                actions.push(Action::Toggle(id));
            }
        }
        Input::Delete(target) => {
            if let Some(id) = resolve(*target, view) {
                actions.push(Action::RequestDelete(id));
            }
        }
        Input::Confirm => actions.push(Action::ConfirmDelete),
        Input::Cancel => {}
        Input::Filter(mode) => actions.push(Action::SetFilter(*mode)),
        Input::Redraw | Input::Help | Input::Quit => {}
    }
    actions
}

/// What the loop should do after a line was applied
#[derive(Debug)]
pub enum Step {
    Redraw,
    Help,
    Invalid(eyre::Report),
    Quit,
}

/// Parse one line and apply it to the app
///
/// An unparseable line still dismisses an open delete prompt.
pub fn apply_line<S: Storage>(app: &mut App<S>, line: &str, now: Instant) -> Step {
    let input = match parse_line(line) {
        Ok(input) => input,
        Err(e) => {
            if app.pending_delete().is_some() {
                app.dispatch(Action::CancelDelete, now);
            }
            return Step::Invalid(e);
        }
    };
    debug!(?input, "shell input");

    if input == Input::Quit {
        return Step::Quit;
    }

    for action in actions_for(&input, &app.view(now)) {
        app.dispatch(action, now);
    }

    match input {
        Input::Help => Step::Help,
        _ => Step::Redraw,
    }
}

/// Run a read-eval-render loop until the user quits or closes input
pub fn run<S: Storage>(app: &mut App<S>) -> Result<()> {
    let mut editor = DefaultEditor::new().context("Failed to start line editor")?;
    print!("{}", render_text_with(&app.view(Instant::now()), true));

    loop {
        app.tick(Instant::now());
        let prompt = if app.pending_delete().is_some() {
            "delete? (yes/no)> "
        } else {
            "tasklist> "
        };

        let line = match editor.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("Failed to read input"),
        };
        if !line.trim().is_empty() {
            let _ = editor.add_history_entry(line.as_str());
        }

        let now = Instant::now();
        match apply_line(app, &line, now) {
            Step::Quit => break,
            Step::Help => println!("{}", HELP),
            Step::Invalid(e) => println!("{}", e.to_string().red()),
            Step::Redraw => print!("{}", render_text_with(&app.view(now), true)),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::store::{Stats, TaskStore};
    use crate::view::Row;

    fn app_with_pending_delete(now: Instant) -> App<MemoryStorage> {
        let mut app = App::new(TaskStore::load(MemoryStorage::default()));
        assert!(matches!(apply_line(&mut app, "add Keep me", now), Step::Redraw));
        assert!(matches!(apply_line(&mut app, "delete #1", now), Step::Redraw));
        assert!(app.pending_delete().is_some());
        app
    }

    fn view_with(ids: &[TaskId], pending_delete: Option<TaskId>) -> View {
        View {
            rows: ids
                .iter()
                .map(|&id| Row {
                    id,
                    text: format!("task {}", id),
                    completed: false,
                    confirming_delete: pending_delete == Some(id),
                })
                .collect(),
            filter: FilterMode::All,
            stats: Stats::default(),
            input: String::new(),
            pending_delete,
            notifications: Vec::new(),
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_line("add Buy milk").unwrap(), Input::Add("Buy milk".to_string()));
        assert_eq!(parse_line("a   spaced  out ").unwrap(), Input::Add("spaced  out".to_string()));
        assert_eq!(parse_line("add").unwrap(), Input::Add(String::new()));
        assert_eq!(parse_line("t 17").unwrap(), Input::Toggle(Target::Id(17)));
        assert_eq!(parse_line("delete #2").unwrap(), Input::Delete(Target::Row(2)));
        assert_eq!(parse_line("YES").unwrap(), Input::Confirm);
        assert_eq!(parse_line("n").unwrap(), Input::Cancel);
        assert_eq!(parse_line("filter done").unwrap(), Input::Filter(FilterMode::Completed));
        assert_eq!(parse_line("").unwrap(), Input::Redraw);
        assert_eq!(parse_line("q").unwrap(), Input::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_line("frobnicate").is_err());
        assert!(parse_line("toggle").is_err());
        assert!(parse_line("toggle abc").is_err());
        assert!(parse_line("delete #0").is_err());
        assert!(parse_line("filter sideways").is_err());
    }

    #[test]
    fn test_resolve_rows() {
        let view = view_with(&[30, 20, 10], None);
        assert_eq!(resolve(Target::Row(1), &view), Some(30));
        assert_eq!(resolve(Target::Row(3), &view), Some(10));
        assert_eq!(resolve(Target::Row(4), &view), None);
        assert_eq!(resolve(Target::Id(99), &view), Some(99));
    }

    #[test]
    fn test_actions_for_add() {
        let view = view_with(&[], None);
        assert_eq!(
            actions_for(&Input::Add("x".to_string()), &view),
            vec![Action::SetInput("x".to_string()), Action::Submit]
        );
    }

    #[test]
    fn test_other_input_cancels_pending_delete() {
        let view = view_with(&[1, 2], Some(2));
        assert_eq!(
            actions_for(&Input::Toggle(Target::Row(1)), &view),
            vec![Action::CancelDelete, Action::Toggle(1)]
        );
        assert_eq!(actions_for(&Input::Confirm, &view), vec![Action::ConfirmDelete]);
        assert_eq!(actions_for(&Input::Cancel, &view), vec![Action::CancelDelete]);
    }

    #[test]
    fn test_help_dismisses_delete_prompt() {
        let now = Instant::now();
        let mut app = app_with_pending_delete(now);

        assert!(matches!(apply_line(&mut app, "help", now), Step::Help));
        assert_eq!(app.pending_delete(), None);
        assert!(matches!(apply_line(&mut app, "yes", now), Step::Redraw));
        assert_eq!(app.store().tasks().len(), 1);
    }

    #[test]
    fn test_bad_input_dismisses_delete_prompt() {
        let now = Instant::now();
        let mut app = app_with_pending_delete(now);

        assert!(matches!(apply_line(&mut app, "frobnicate", now), Step::Invalid(_)));
        assert_eq!(app.pending_delete(), None);
        assert!(matches!(apply_line(&mut app, "yes", now), Step::Redraw));
        assert_eq!(app.store().tasks().len(), 1);
    }

    #[test]
    fn test_confirm_deletes_through_shell() {
        let now = Instant::now();
        let mut app = app_with_pending_delete(now);

        apply_line(&mut app, "y", now);
        assert!(app.store().tasks().is_empty());
        assert!(matches!(apply_line(&mut app, "quit", now), Step::Quit));
    }
}
