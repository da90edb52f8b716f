//! High-level store API for td.

use crate::id::{base_id, unique_id};
use crate::storage::{Scan, Storage};
use crate::types::{State, Task, TaskPatch, ValidationError, validate_title};
use chrono::Local;
use eyre::{Context, Result};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Errors that can occur during store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Task (or parent, or tree root) not found.
    NotFound(String),
    /// Input rejected before anything was written.
    Validation(ValidationError),
    /// A task file or the task directory could not be read or written.
    Storage { path: PathBuf, reason: String },
}

impl StoreError {
    /// Stable tag for machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "not_found",
            StoreError::Validation(_) => "validation",
            StoreError::Storage { .. } => "storage",
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "task not found: {}", id),
            StoreError::Validation(e) => write!(f, "validation error: {}", e),
            StoreError::Storage { path, reason } => {
                write!(f, "storage error at {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// What happens to the children of a deleted task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Promote children to the deleted task's own parent.
    #[default]
    Reparent,
    /// Refuse to delete while children exist.
    Reject,
    /// Delete the whole subtree.
    Cascade,
}

/// Outcome of a delete.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Removal {
    /// Ids whose files were removed, leaves first
    pub removed: Vec<String>,
    /// Ids of children moved to the deleted task's parent
    pub reparented: Vec<String>,
}

/// The main td store.
#[derive(Debug)]
pub struct Store {
    storage: Storage,
}

impl Store {
    /// Initialize a new store in the given directory.
    pub fn init(root: &Path) -> Result<Self> {
        let storage = Storage::init(root)?;
        Ok(Self { storage })
    }

    /// Open an existing store.
    pub fn open(root: &Path) -> Result<Self> {
        let storage = Storage::open(root)?;
        Ok(Self { storage })
    }

    /// Open the store of the nearest enclosing project, searching upwards from `start`.
    pub fn discover(start: &Path) -> Result<Self> {
        match Storage::find_root(start) {
            Some(root) => Self::open(&root),
            None => Err(eyre::eyre!(StoreError::Storage {
                path: start.to_path_buf(),
                reason: "no .td directory found here or in any parent. Run 'td init' first."
                    .to_string(),
            })),
        }
    }

    /// Project root (the directory containing `.td/`).
    pub fn root(&self) -> &Path {
        self.storage.root()
    }

    /// Create a new task.
    pub fn create(
        &mut self,
        title: &str,
        state: Option<State>,
        parent: Option<&str>,
        id_override: Option<&str>,
    ) -> Result<Task> {
        validate_title(title).map_err(validation)?;
        let base = base_id(title, id_override).map_err(validation)?;

        // A parent must load, not just have a file
        if let Some(parent) = parent {
            self.get(parent)?;
        }

        let id = unique_id(&base, |candidate| self.storage.exists(candidate));
        let now = Local::now();
        let task = Task {
            id,
            title: title.to_string(),
            state: state.unwrap_or_default(),
            parent: parent.map(String::from),
            created: now,
            updated: now,
            notes: None,
        };

        self.storage.write_task(&task).context("Failed to persist task")?;
        Ok(task)
    }

    /// Get a task by exact id.
    pub fn get(&self, id: &str) -> Result<Task> {
        self.storage.read_task(id)?.ok_or_else(|| not_found(id))
    }

    /// Apply the supplied fields to a task.
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<Task> {
        let existing = self.get(id)?;
        if patch.is_empty() {
            return Ok(existing);
        }

        if let Some(title) = &patch.title {
            validate_title(title).map_err(validation)?;
        }
        if let Some(Some(parent)) = &patch.parent {
            self.check_new_parent(id, parent)?;
        }

        let updated = Task {
            title: patch.title.unwrap_or(existing.title),
            notes: match patch.notes {
                Some(notes) => notes.filter(|n| !n.is_empty()),
                None => existing.notes,
            },
            state: patch.state.unwrap_or(existing.state),
            parent: match patch.parent {
                Some(parent) => parent,
                None => existing.parent,
            },
            updated: Local::now(),
            ..existing
        };

        self.storage
            .write_task(&updated)
            .context("Failed to persist updated task")?;
        Ok(updated)
    }

    /// Change a task's state. Every transition is allowed.
    pub fn set_state(&mut self, id: &str, state: State) -> Result<Task> {
        self.update(id, TaskPatch::new().state(state))
    }

    /// Move a task under `parent`, or to the top level with `None`.
    pub fn move_to(&mut self, id: &str, parent: Option<&str>) -> Result<Task> {
        self.update(id, TaskPatch::new().parent(parent))
    }

    /// Delete a task, resolving its children with `policy`.
    pub fn delete(&mut self, id: &str, policy: DeletePolicy) -> Result<Removal> {
        let task = self.get(id)?;
        let tasks = self.list_all()?;
        let children: Vec<&Task> = tasks
            .iter()
            .filter(|t| t.parent.as_deref() == Some(id))
            .collect();

        let mut removal = Removal::default();
        match policy {
            DeletePolicy::Reject if !children.is_empty() => {
                return Err(validation(ValidationError::HasChildren {
                    id: id.to_string(),
                    count: children.len(),
                }));
            }
            DeletePolicy::Reject => {}
            DeletePolicy::Reparent => {
                // Children are rewritten before the parent's file goes away
                let now = Local::now();
                for child in children {
                    let moved = Task {
                        parent: task.parent.clone(),
                        updated: now,
                        ..child.clone()
                    };
                    self.storage
                        .write_task(&moved)
                        .context("Failed to re-parent child task")?;
                    removal.reparented.push(moved.id);
                }
            }
            DeletePolicy::Cascade => {
                for descendant in descendants_leaves_first(&tasks, id) {
                    self.storage
                        .remove_task(&descendant)
                        .context("Failed to remove descendant task")?;
                    removal.removed.push(descendant);
                }
            }
        }

        self.storage.remove_task(id).context("Failed to remove task")?;
        removal.removed.push(id.to_string());
        Ok(removal)
    }

    /// Every task in creation order. Unreadable files are left out; use
    /// [`Store::scan`] to see them.
    pub fn list_all(&self) -> Result<Vec<Task>> {
        Ok(self.storage.scan()?.tasks)
    }

    /// Every task plus the files that could not be loaded.
    pub fn scan(&self) -> Result<Scan> {
        self.storage.scan()
    }

    /// Validate `parent` as the new parent of `id`: it must exist and must not
    /// be `id` itself or one of its descendants.
    fn check_new_parent(&self, id: &str, parent: &str) -> Result<()> {
        if parent == id {
            return Err(validation(ValidationError::SelfParent(id.to_string())));
        }
        self.get(parent)?;

        let tasks = self.list_all()?;
        let parents: HashMap<&str, Option<&str>> = tasks
            .iter()
            .map(|t| (t.id.as_str(), t.parent.as_deref()))
            .collect();

        // Walk up from the new parent; reaching `id` means a cycle.
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = Some(parent);
        while let Some(node) = current {
            if node == id {
                return Err(validation(ValidationError::ParentCycle {
                    id: id.to_string(),
                    parent: parent.to_string(),
                }));
            }
            if !seen.insert(node) {
                // Loop above the new parent that does not involve `id`
                return Err(eyre::eyre!(StoreError::Storage {
                    path: self.storage.task_path(node),
                    reason: format!("parent chain above '{}' loops back to '{}'", parent, node),
                }));
            }
            current = parents.get(node).copied().flatten();
        }
        Ok(())
    }
}

/// Ids of every descendant of `id`, ordered so each task comes before its parent.
fn descendants_leaves_first(tasks: &[Task], id: &str) -> Vec<String> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for task in tasks {
        if let Some(parent) = task.parent.as_deref() {
            children.entry(parent).or_default().push(task.id.as_str());
        }
    }

    // Breadth-first from `id`, then reversed
    let mut visited: HashSet<&str> = HashSet::from([id]);
    let mut order: Vec<&str> = Vec::new();
    let mut index = 0;
    let mut frontier = vec![id];
    while index < frontier.len() {
        let node = frontier[index];
        index += 1;
        for &child in children.get(node).map(Vec::as_slice).unwrap_or_default() {
            if visited.insert(child) {
                order.push(child);
                frontier.push(child);
            }
        }
    }

    order.into_iter().rev().map(String::from).collect()
}

fn not_found(id: &str) -> eyre::Report {
    eyre::eyre!(StoreError::NotFound(id.to_string()))
}

fn validation(e: ValidationError) -> eyre::Report {
    eyre::eyre!(StoreError::Validation(e))
}
