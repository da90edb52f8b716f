//! Read-only queries over a snapshot of the store.
//!
//! Every function here is pure: it takes the tasks it works on and never
//! touches the disk. [`StoreQueryExt`] runs them against a fresh
//! [`Store::list_all`] read.

use crate::store::{Store, StoreError};
use crate::types::{State, Task};
use eyre::Result;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A task with its children attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub task: Task,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of tasks in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::count).sum::<usize>()
    }
}

/// Number of tasks per state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub focus: usize,
    pub active: usize,
    pub later: usize,
    pub done: usize,
    pub total: usize,
}

impl StatusCounts {
    pub fn get(&self, state: State) -> usize {
        match state {
            State::Focus => self.focus,
            State::Active => self.active,
            State::Later => self.later,
            State::Done => self.done,
        }
    }
}

/// Keep tasks in `state`, or everything but `done` unless `include_done`.
pub fn filter(tasks: &[Task], state: Option<State>, include_done: bool) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| match state {
            Some(state) => t.state == state,
            None => include_done || t.state != State::Done,
        })
        .cloned()
        .collect()
}

/// Stable sort focus, active, later, done.
pub fn sort_by_state(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| t.state);
}

/// Arrange tasks into a forest.
///
/// With `root_id`, returns just that task's subtree. Otherwise returns every
/// root: tasks without a parent, and tasks whose parent is not among `tasks`.
/// Siblings keep the order they have in `tasks`.
pub fn build_tree(tasks: &[Task], root_id: Option<&str>) -> Result<Vec<TreeNode>> {
    let by_id: HashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();
    let mut children: HashMap<&str, Vec<&Task>> = HashMap::new();
    for task in tasks {
        if let Some(parent) = task.parent.as_deref() {
            children.entry(parent).or_default().push(task);
        }
    }

    let roots: Vec<&Task> = match root_id {
        Some(id) => {
            let root = by_id
                .get(id)
                .ok_or_else(|| eyre::eyre!(StoreError::NotFound(id.to_string())))?;
            vec![*root]
        }
        None => tasks
            .iter()
            .filter(|t| match t.parent.as_deref() {
                None => true,
                Some(parent) => !by_id.contains_key(parent),
            })
            .collect(),
    };

    let mut visited: HashSet<&str> = HashSet::new();
    Ok(roots
        .into_iter()
        .filter_map(|root| attach(root, &children, &mut visited))
        .collect())
}

/// Build one node. The visited set stops a corrupt, cyclic parent graph from
/// recursing forever: each task appears at most once in the forest.
fn attach<'a>(
    task: &'a Task,
    children: &HashMap<&str, Vec<&'a Task>>,
    visited: &mut HashSet<&'a str>,
) -> Option<TreeNode> {
    if !visited.insert(task.id.as_str()) {
        return None;
    }
    let kids = children
        .get(task.id.as_str())
        .map(|kids| {
            kids.iter()
                .filter_map(|kid| attach(*kid, children, visited))
                .collect()
        })
        .unwrap_or_default();
    Some(TreeNode {
        task: task.clone(),
        children: kids,
    })
}

/// Tally tasks per state.
pub fn status_counts(tasks: &[Task]) -> StatusCounts {
    tasks.iter().fold(StatusCounts::default(), |mut counts, task| {
        match task.state {
            State::Focus => counts.focus += 1,
            State::Active => counts.active += 1,
            State::Later => counts.later += 1,
            State::Done => counts.done += 1,
        }
        counts.total += 1;
        counts
    })
}

/// Queries run against the store's current contents.
pub trait StoreQueryExt {
    /// Filtered list, sorted by state.
    fn list(&self, state: Option<State>, include_done: bool) -> Result<Vec<Task>>;

    /// Forest of all tasks, or the subtree under `root_id`.
    fn tree(&self, root_id: Option<&str>) -> Result<Vec<TreeNode>>;

    /// Per-state counts over every task.
    fn status(&self) -> Result<StatusCounts>;
}

impl StoreQueryExt for Store {
    fn list(&self, state: Option<State>, include_done: bool) -> Result<Vec<Task>> {
        let mut tasks = filter(&self.list_all()?, state, include_done);
        sort_by_state(&mut tasks);
        Ok(tasks)
    }

    fn tree(&self, root_id: Option<&str>) -> Result<Vec<TreeNode>> {
        build_tree(&self.list_all()?, root_id)
    }

    fn status(&self) -> Result<StatusCounts> {
        Ok(status_counts(&self.list_all()?))
    }
}
