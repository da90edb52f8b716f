//! td: a local task state manager.
//!
//! Tasks live as one YAML file each under `.td/tasks/` in a project
//! directory. Every task has a slug id derived from its title, one of four
//! states (focus, active, later, done), and an optional parent, which
//! together form a forest.
//!
//! # Example
//!
//! ```no_run
//! use td::{DeletePolicy, State, Store, StoreQueryExt};
//! use std::path::Path;
//!
//! // Initialize a new store
//! let mut store = Store::init(Path::new(".")).unwrap();
//!
//! // Create tasks
//! let epic = store.create("Build auth system", None, None, None).unwrap();
//! let ui = store
//!     .create("Login UI", Some(State::Focus), Some(epic.id.as_str()), None)
//!     .unwrap();
//! assert_eq!(ui.id, "login-ui");
//!
//! // One root with one child
//! let forest = store.tree(None).unwrap();
//! assert_eq!(forest.len(), 1);
//! assert_eq!(forest[0].children.len(), 1);
//!
//! // Finish the child and count
//! store.set_state(&ui.id, State::Done).unwrap();
//! let counts = store.status().unwrap();
//! assert_eq!((counts.active, counts.done, counts.total), (1, 1, 2));
//!
//! // Remove the parent; its child moves up a level
//! store.delete(&epic.id, DeletePolicy::Reparent).unwrap();
//! ```

mod builder;
mod id;
mod query;
mod storage;
mod store;
mod types;

// Re-export public API
pub use builder::{StoreBuilderExt, TaskBuilder};
pub use id::{is_valid_slug, slugify};
pub use query::{StatusCounts, StoreQueryExt, TreeNode, build_tree, filter, sort_by_state, status_counts};
pub use storage::{Scan, SkippedFile, TASKS_DIR, TD_DIR};
pub use store::{DeletePolicy, Removal, Store, StoreError};
pub use types::{State, Task, TaskPatch, ValidationError};
