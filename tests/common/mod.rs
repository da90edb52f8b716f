//! Shared test infrastructure for td integration tests.
//!
//! Provides TestEnv helper for consistent test setup/teardown.

#![allow(dead_code)]

use std::collections::HashSet;
use td::{DeletePolicy, State, Store, StoreError, StoreQueryExt, Task};
use tempfile::TempDir;

/// Test environment with automatic cleanup.
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub store: Store,
}

impl TestEnv {
    /// Create a new test environment with an initialized store.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Store::init(temp_dir.path()).expect("Failed to init store");
        Self { temp_dir, store }
    }

    /// Create a root task in the default state.
    pub fn create_task(&mut self, title: &str) -> Task {
        self.store
            .create(title, None, None, None)
            .expect("Failed to create task")
    }

    /// Create a task under `parent`.
    pub fn create_child(&mut self, title: &str, parent: &Task) -> Task {
        self.store
            .create(title, None, Some(parent.id.as_str()), None)
            .expect("Failed to create child task")
    }

    /// Create a task in a given state.
    pub fn create_task_with_state(&mut self, title: &str, state: State) -> Task {
        self.store
            .create(title, Some(state), None, None)
            .expect("Failed to create task")
    }

    /// Move `task` under `parent`.
    pub fn move_under(&mut self, task: &Task, parent: &Task) -> Task {
        self.store
            .move_to(&task.id, Some(parent.id.as_str()))
            .expect("Failed to move task")
    }

    /// Delete with the default policy.
    pub fn delete(&mut self, task: &Task) {
        self.store
            .delete(&task.id, DeletePolicy::default())
            .expect("Failed to delete task");
    }

    /// Reload a task from disk.
    pub fn reload(&self, task: &Task) -> Task {
        self.store.get(&task.id).expect("Failed to reload task")
    }

    /// Ids of every task, in creation order.
    pub fn all_ids(&self) -> Vec<String> {
        self.store
            .list_all()
            .expect("Failed to list tasks")
            .into_iter()
            .map(|t| t.id)
            .collect()
    }

    /// Get all tasks count.
    pub fn total_count(&self) -> usize {
        self.store.list_all().expect("Failed to list tasks").len()
    }

    /// Get tasks count by state.
    pub fn count_by_state(&self, state: State) -> usize {
        self.store.list(Some(state), true).expect("Failed to list tasks").len()
    }

    /// Path of a task's file.
    pub fn task_file(&self, id: &str) -> std::path::PathBuf {
        self.temp_dir
            .path()
            .join(td::TD_DIR)
            .join(td::TASKS_DIR)
            .join(format!("{}.yaml", id))
    }

    /// Assert that every parent reference names an existing task and that
    /// no task is its own ancestor.
    pub fn assert_forest(&self) {
        let tasks = self.store.list_all().expect("Failed to list tasks");
        let ids: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();

        for task in &tasks {
            if let Some(parent) = &task.parent {
                assert!(
                    ids.contains(parent.as_str()),
                    "Task {} points at missing parent {}",
                    task.id,
                    parent
                );
            }

            let mut seen = HashSet::new();
            let mut current = task.parent.as_deref();
            while let Some(id) = current {
                assert!(seen.insert(id), "Cycle through {}", task.id);
                assert_ne!(id, task.id, "Task {} is its own ancestor", task.id);
                current = tasks
                    .iter()
                    .find(|t| t.id == id)
                    .and_then(|t| t.parent.as_deref());
            }
        }
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Unwrap the typed store error from a failed result.
pub fn store_error<T: std::fmt::Debug>(result: eyre::Result<T>) -> StoreError {
    let report = result.expect_err("Expected an error");
    match report.downcast::<StoreError>() {
        Ok(e) => e,
        Err(other) => panic!("Expected StoreError, got {:?}", other),
    }
}
