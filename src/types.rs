//! Core data types for td tasks.

use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest title accepted, in characters.
pub const MAX_TITLE_LEN: usize = 500;

/// One task record, stored as `<id>.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Slug identifier, unique within the store
    pub id: String,

    /// Short description of the work
    pub title: String,

    /// Current intent
    pub state: State,

    /// Id of the parent task, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// When created
    pub created: DateTime<Local>,

    /// Last modification
    pub updated: DateTime<Local>,

    /// Free-form notes
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub notes: Option<String>,
}

/// Where a task sits in the user's attention.
///
/// Every state may move to every other state; there is no workflow here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Focus,
    #[default]
    Active,
    Later,
    Done,
}

impl State {
    /// All states, in display order.
    pub const ALL: [State; 4] = [State::Focus, State::Active, State::Later, State::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            State::Focus => "focus",
            State::Active => "active",
            State::Later => "later",
            State::Done => "done",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for State {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "focus" => Ok(State::Focus),
            "active" => Ok(State::Active),
            "later" => Ok(State::Later),
            "done" => Ok(State::Done),
            _ => Err(ValidationError::InvalidState(s.to_string())),
        }
    }
}

/// Fields to change on an existing task. `None` leaves a field alone.
///
/// `notes` and `parent` are doubly optional: `Some(None)` clears them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub notes: Option<Option<String>>,
    pub state: Option<State>,
    pub parent: Option<Option<String>>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn notes(mut self, notes: Option<impl Into<String>>) -> Self {
        self.notes = Some(notes.map(Into::into));
        self
    }

    pub fn state(mut self, state: State) -> Self {
        self.state = Some(state);
        self
    }

    pub fn parent(mut self, parent: Option<impl Into<String>>) -> Self {
        self.parent = Some(parent.map(Into::into));
        self
    }

    /// True when applying the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.notes.is_none() && self.state.is_none() && self.parent.is_none()
    }
}

/// Malformed input rejected before anything is written.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyTitle,
    TitleTooLong,
    InvalidCharacters,
    EmptySlug(String),
    InvalidId(String),
    InvalidState(String),
    SelfParent(String),
    ParentCycle { id: String, parent: String },
    HasChildren { id: String, count: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyTitle => write!(f, "title cannot be empty"),
            ValidationError::TitleTooLong => write!(f, "title exceeds {} characters", MAX_TITLE_LEN),
            ValidationError::InvalidCharacters => write!(f, "title contains control characters"),
            ValidationError::EmptySlug(title) => {
                write!(f, "title '{}' must produce a valid slug", title)
            }
            ValidationError::InvalidId(id) => write!(
                f,
                "invalid task id '{}': use lowercase letters, digits and single hyphens",
                id
            ),
            ValidationError::InvalidState(state) => write!(
                f,
                "invalid state '{}': expected one of focus, active, later, done",
                state
            ),
            ValidationError::SelfParent(id) => write!(f, "task '{}' cannot be its own parent", id),
            ValidationError::ParentCycle { id, parent } => write!(
                f,
                "moving '{}' under '{}' would create a cycle",
                id, parent
            ),
            ValidationError::HasChildren { id, count } => {
                write!(f, "task '{}' still has {} child task(s)", id, count)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check a title before it is stored.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong);
    }
    if title.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidCharacters);
    }
    Ok(())
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let notes = Option::<String>::deserialize(deserializer)?;
    Ok(notes.filter(|n| !n.is_empty()))
}
