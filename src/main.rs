//! td CLI - a local task state manager.

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use serde::Serialize;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use td::{
    DeletePolicy, Removal, SkippedFile, State, StatusCounts, Store, StoreError, Task, TaskPatch, TreeNode, build_tree,
    filter, sort_by_state, status_counts,
};

mod cli;

use cli::{Cli, Command};

const SKILL: &str = include_str!("../SKILL.md");

fn setup_logging() -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("td")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("td.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn get_start_dir(cli: &Cli) -> PathBuf {
    cli.dir
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn format_state(state: State, width: usize) -> ColoredString {
    let padded = format!("{:<width$}", state.as_str(), width = width);
    match state {
        State::Focus => padded.magenta().bold(),
        State::Active => padded.green(),
        State::Later => padded.blue(),
        State::Done => padded.dimmed(),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Load every task, warning on stderr about files that could not be read.
fn load_tasks(store: &Store) -> Result<Vec<Task>> {
    let scan = store.scan()?;
    for SkippedFile { path, reason } in &scan.skipped {
        eprintln!("{} skipped {}: {}", "warning:".yellow().bold(), path.display(), reason);
    }
    Ok(scan.tasks)
}

fn print_tree(nodes: &[TreeNode], depth: usize) {
    for node in nodes {
        println!(
            "{}{} [{}]",
            "  ".repeat(depth),
            node.task.id.cyan(),
            format_state(node.task.state, 0)
        );
        print_tree(&node.children, depth + 1);
    }
}

fn print_task(task: &Task) {
    println!("{}      {}", "id:".bold(), task.id.cyan());
    println!("{}   {}", "title:".bold(), task.title);
    println!("{}   {}", "state:".bold(), format_state(task.state, 0));
    if let Some(parent) = &task.parent {
        println!("{}  {}", "parent:".bold(), parent.cyan());
    }
    if let Some(notes) = &task.notes {
        println!("{}   {}", "notes:".bold(), notes);
    }
    println!("{} {}", "created:".bold(), task.created.format("%Y-%m-%d %H:%M:%S"));
    println!("{} {}", "updated:".bold(), task.updated.format("%Y-%m-%d %H:%M:%S"));
}

fn print_status(counts: &StatusCounts) {
    let parts: Vec<String> = State::ALL
        .iter()
        .map(|state| format!("{}: {}", state, counts.get(*state)))
        .chain(std::iter::once(format!("total: {}", counts.total)))
        .collect();
    println!("{}", parts.join("  "));
}

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    io::stdout().flush().ok();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    let answer = input.trim().to_lowercase();
    answer == "y" || answer == "yes"
}

fn set_state(start: &Path, json: bool, id: &str, state: State) -> Result<()> {
    let mut store = Store::discover(start)?;
    let task = store.set_state(id, state)?;

    if json {
        print_json(&task)?;
    } else {
        println!("{} {} {}", task.id.cyan(), "→".blue(), format_state(task.state, 0));
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let start = get_start_dir(&cli);
    let json = cli.json;

    match cli.command {
        Command::Init => {
            let store = Store::init(&start).context("Failed to initialize td store")?;
            if json {
                print_json(&serde_json::json!({ "root": store.root() }))?;
            } else {
                println!("{} Initialized .td/ in {}", "✓".green(), store.root().display());
            }
        }

        Command::Add {
            title,
            parent,
            state,
            custom_id,
        } => {
            let mut store = Store::discover(&start)?;
            let task = store.create(&title, state, parent.as_deref(), custom_id.as_deref())?;

            if json {
                print_json(&task)?;
            } else {
                println!("{}", task.id);
            }
        }

        Command::Focus(task) => set_state(&start, json, &task.id, State::Focus)?,
        Command::Active(task) => set_state(&start, json, &task.id, State::Active)?,
        Command::Later(task) => set_state(&start, json, &task.id, State::Later)?,
        Command::Done(task) => set_state(&start, json, &task.id, State::Done)?,

        Command::Ls { state, all } => {
            let store = Store::discover(&start)?;
            let mut tasks = filter(&load_tasks(&store)?, state, all);
            sort_by_state(&mut tasks);

            if json {
                print_json(&tasks)?;
            } else if tasks.is_empty() {
                println!("{}", "No tasks.".dimmed());
            } else {
                let id_width = tasks.iter().map(|t| t.id.len()).max().unwrap_or(2).max(2);
                let state_width = tasks.iter().map(|t| t.state.as_str().len()).max().unwrap_or(5).max(5);
                println!(
                    "{}  {}  {}",
                    format!("{:<state_width$}", "STATE").bold(),
                    format!("{:<id_width$}", "ID").bold(),
                    "TITLE".bold()
                );
                for task in tasks {
                    println!(
                        "{}  {}  {}",
                        format_state(task.state, state_width),
                        format!("{:<id_width$}", task.id).cyan(),
                        task.title
                    );
                }
            }
        }

        Command::Tree { id, all } => {
            let store = Store::discover(&start)?;
            let tasks: Vec<Task> = load_tasks(&store)?
                .into_iter()
                .filter(|t| all || t.state != State::Done || Some(t.id.as_str()) == id.as_deref())
                .collect();
            let forest = build_tree(&tasks, id.as_deref())?;

            if json {
                print_json(&forest)?;
            } else if forest.is_empty() {
                println!("{}", "No tasks.".dimmed());
            } else {
                print_tree(&forest, 0);
            }
        }

        Command::Show(task) => {
            let store = Store::discover(&start)?;
            let task = store.get(&task.id)?;

            if json {
                print_json(&task)?;
            } else {
                print_task(&task);
            }
        }

        Command::Edit {
            id,
            title,
            notes,
            parent,
        } => {
            let mut store = Store::discover(&start)?;
            let patch = TaskPatch {
                title,
                notes: notes.map(|n| Some(n).filter(|n| !n.is_empty())),
                state: None,
                parent: parent.map(|p| Some(p).filter(|p| !p.is_empty())),
            };

            if patch.is_empty() {
                // Still fail on unknown ids
                let task = store.get(&id)?;
                if json {
                    print_json(&task)?;
                } else {
                    println!("{}", "Nothing to update.".dimmed());
                }
            } else {
                let task = store.update(&id, patch)?;
                if json {
                    print_json(&task)?;
                } else {
                    println!("{} Updated {}", "✓".green(), task.id.cyan());
                }
            }
        }

        Command::Mv { id, parent_id } => {
            let mut store = Store::discover(&start)?;
            let task = store.move_to(&id, Some(parent_id.as_str()))?;

            if json {
                print_json(&task)?;
            } else {
                println!("{} Moved {} {} {}", "✓".green(), task.id.cyan(), "→".blue(), parent_id.cyan());
            }
        }

        Command::Rm {
            id,
            force,
            cascade,
            reject_children,
        } => {
            let mut store = Store::discover(&start)?;
            // Verify it exists before asking
            store.get(&id)?;

            if !force {
                if !io::stdin().is_terminal() {
                    eyre::bail!("refusing to delete '{}' without --force when not running interactively", id);
                }
                if !confirm(&format!("Delete task '{}'?", id)) {
                    println!("Aborted.");
                    return Ok(());
                }
            }

            let policy = if cascade {
                DeletePolicy::Cascade
            } else if reject_children {
                DeletePolicy::Reject
            } else {
                DeletePolicy::Reparent
            };
            let removal = store.delete(&id, policy)?;
            info!("Deleted {} with {:?}: {:?}", id, policy, removal);

            if json {
                print_json(&removal)?;
            } else {
                let Removal { removed, reparented } = &removal;
                println!("{} Deleted {}", "✓".green(), removed.join(", ").cyan());
                if !reparented.is_empty() {
                    println!("  moved up a level: {}", reparented.join(", ").cyan());
                }
            }
        }

        Command::Status => {
            let store = Store::discover(&start)?;
            let counts = status_counts(&load_tasks(&store)?);

            if json {
                print_json(&counts)?;
            } else {
                print_status(&counts);
            }
        }

        Command::Skill => {
            print!("{}", SKILL);
        }
    }

    Ok(())
}

fn report_error(e: &eyre::Report, json: bool) {
    let kind = e.downcast_ref::<StoreError>().map(StoreError::kind).unwrap_or("other");
    let message = format!("{:#}", e);

    if json {
        let body = serde_json::json!({ "error": { "kind": kind, "message": message } });
        println!("{}", body);
    } else {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let json = cli.json;
    info!("Command: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(cli) {
        log::error!("{:#}", e);
        report_error(&e, json);
        std::process::exit(1);
    }

    Ok(())
}
