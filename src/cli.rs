//! CLI argument parsing for td.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use td::State;

#[derive(Parser)]
#[command(
    name = "td",
    about = "A local task state manager",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: ~/.local/share/td/logs/td.log"
)]
pub struct Cli {
    /// Directory to start looking for .td/ from (default: current directory)
    #[arg(short = 'd', long, global = true)]
    pub dir: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize .td/ in the current directory
    Init,

    /// Create a new task
    Add {
        /// Task title
        title: String,

        /// Parent task ID
        #[arg(short, long)]
        parent: Option<String>,

        /// Initial state: focus, active, later, done (default: active)
        #[arg(short, long)]
        state: Option<State>,

        /// Custom task ID instead of one derived from the title
        #[arg(long = "id")]
        custom_id: Option<String>,
    },

    /// Move a task to focus
    Focus(TaskId),

    /// Move a task to active
    Active(TaskId),

    /// Park a task for later
    Later(TaskId),

    /// Mark a task as done
    Done(TaskId),

    /// List tasks
    Ls {
        /// Only tasks in this state
        #[arg(short, long)]
        state: Option<State>,

        /// Include done tasks
        #[arg(short, long)]
        all: bool,
    },

    /// Show tasks as a tree
    Tree {
        /// Show only the subtree under this task
        id: Option<String>,

        /// Include done tasks
        #[arg(short, long)]
        all: bool,
    },

    /// Show full details of a task
    Show(TaskId),

    /// Edit a task's title, notes, or parent
    Edit {
        /// Task ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New notes (empty string to remove)
        #[arg(long)]
        notes: Option<String>,

        /// New parent ID (empty string to remove)
        #[arg(long)]
        parent: Option<String>,
    },

    /// Move a task under a different parent
    Mv {
        /// Task ID
        id: String,

        /// New parent ID
        parent_id: String,
    },

    /// Remove a task (children move up to its parent by default)
    Rm {
        /// Task ID
        id: String,

        /// Skip confirmation
        #[arg(short, long)]
        force: bool,

        /// Also remove every descendant
        #[arg(long, conflicts_with = "reject_children")]
        cascade: bool,

        /// Refuse to remove a task that has children
        #[arg(long)]
        reject_children: bool,
    },

    /// Show summary counts by state
    Status,

    /// Print the td-tasks agent skill (SKILL.md)
    Skill,
}

#[derive(Args)]
pub struct TaskId {
    /// Task ID
    pub id: String,
}
