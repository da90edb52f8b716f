//! Builder pattern API for creating tasks.

use crate::store::Store;
use crate::types::{State, Task};
use eyre::Result;

/// Builder for creating tasks with a fluent API.
///
/// # Example
///
/// ```ignore
/// let task = store.build("Login UI")
///     .parent("build-auth-system")
///     .state(State::Focus)
///     .create()?;
/// ```
pub struct TaskBuilder<'a> {
    store: &'a mut Store,
    title: String,
    state: Option<State>,
    parent: Option<String>,
    id: Option<String>,
}

impl<'a> TaskBuilder<'a> {
    /// Create a new builder with the given title.
    pub fn new(store: &'a mut Store, title: impl Into<String>) -> Self {
        Self {
            store,
            title: title.into(),
            state: None,
            parent: None,
            id: None,
        }
    }

    /// Set the initial state (default: active).
    pub fn state(mut self, state: State) -> Self {
        self.state = Some(state);
        self
    }

    /// Place the task under an existing task.
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Use an explicit id instead of the title's slug.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Create the task.
    pub fn create(self) -> Result<Task> {
        self.store
            .create(&self.title, self.state, self.parent.as_deref(), self.id.as_deref())
    }
}

/// Extension trait to add builder method to Store.
pub trait StoreBuilderExt {
    /// Start building a new task with the given title.
    fn build(&mut self, title: impl Into<String>) -> TaskBuilder<'_>;
}

impl StoreBuilderExt for Store {
    fn build(&mut self, title: impl Into<String>) -> TaskBuilder<'_> {
        TaskBuilder::new(self, title)
    }
}
