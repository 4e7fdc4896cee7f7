use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tasklist::cli::{Cli, Command};
use tasklist::view::render_notifications;
use tasklist::{Action, App, Config, NotificationCenter, Storage, TaskStore, open_storage, render_html, render_text};

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    setup_logging();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(store_path) = cli.store_path {
        config.store_path = store_path;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    info!(store_path = ?config.store_path, backend = ?config.backend, "tasklist starting");

    let storage = open_storage(config.backend, &config.store_path)?;
    let mut store = TaskStore::load(storage);
    store.set_filter(config.default_filter);
    let notifications = NotificationCenter::new(config.notification_duration(), config.transition());
    let mut app = App::with_notifications(store, notifications);

    let now = Instant::now();
    match cli.command {
        Command::Add { text } => {
            let before = app.store().tasks().len();
            app.dispatch(Action::SetInput(text.join(" ")), now);
            app.dispatch(Action::Submit, now);
            print_feedback(&app, now);
            if app.store().tasks().len() > before {
                if let Some(task) = app.store().tasks().first() {
                    println!("{} {}", task.id.to_string().cyan(), task.text);
                }
            }
        }
        Command::Toggle { id } => {
            if app.store().get(id).is_none() {
                println!("{}", format!("No task with id {}", id).dimmed());
            }
            app.dispatch(Action::Toggle(id), now);
            print_feedback(&app, now);
        }
        Command::Delete { id, yes } => {
            app.dispatch(Action::RequestDelete(id), now);
            match app.store().get(id) {
                None => println!("{}", format!("No task with id {}", id).dimmed()),
                Some(task) if !yes => {
                    println!("Delete task {} \"{}\"?", id.to_string().cyan(), task.text);
                    println!("Re-run with {} to confirm.", "--yes".bold());
                    app.dispatch(Action::CancelDelete, now);
                }
                Some(_) => {
                    app.dispatch(Action::ConfirmDelete, now);
                    print_feedback(&app, now);
                }
            }
        }
        Command::List { filter } => {
            if let Some(filter) = filter {
                app.dispatch(Action::SetFilter(filter), now);
            }
            print!("{}", render_text(&app.view(now)));
        }
        Command::Stats => {
            let stats = app.store().stats();
            println!("Total:     {}", stats.total);
            println!("Completed: {}", stats.completed.to_string().green());
            println!("Pending:   {}", stats.pending.to_string().yellow());
        }
        Command::Export { filter, output } => {
            if let Some(filter) = filter {
                app.dispatch(Action::SetFilter(filter), now);
            }
            let html = render_html(&app.view(now));
            match output {
                Some(path) => {
                    std::fs::write(&path, html).context(format!("Failed to write {}", path.display()))?;
                    println!("{} Exported to {}", "✓".green(), path.display());
                }
                None => print!("{}", html),
            }
        }
        Command::Shell => {
            tasklist::shell::run(&mut app)?;
        }
    }

    Ok(())
}

fn print_feedback<S: Storage>(app: &App<S>, now: Instant) {
    print!("{}", render_notifications(&app.view(now).notifications));
}
