//! Identifier and validated scalar types for the task domain.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum task title length in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// Maximum task description length in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

/// Unique identifier for a task record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new random task identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a task identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for TaskId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated task title: trimmed, non-blank, at most [`MAX_TITLE_CHARS`]
/// characters.
///
/// # Examples
///
/// ```
/// use factotum::task::domain::TaskTitle;
///
/// let title = TaskTitle::new("  Buy milk  ").expect("valid title");
/// assert_eq!(title.as_str(), "Buy milk");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTitle(String);

impl TaskTitle {
    /// Creates a validated title.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the value is blank after
    /// trimming, or [`TaskDomainError::TitleTooLong`] when it exceeds
    /// [`MAX_TITLE_CHARS`].
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let trimmed = value.into().trim().to_owned();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        let length = trimmed.chars().count();
        if length > MAX_TITLE_CHARS {
            return Err(TaskDomainError::TitleTooLong(length));
        }
        Ok(Self(trimmed))
    }

    /// Returns the title as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskTitle {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated task description: trimmed, at most [`MAX_DESCRIPTION_CHARS`]
/// characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskDescription(String);

impl TaskDescription {
    /// Creates a validated description.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DescriptionTooLong`] when the value
    /// exceeds [`MAX_DESCRIPTION_CHARS`].
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let trimmed = value.into().trim().to_owned();
        let length = trimmed.chars().count();
        if length > MAX_DESCRIPTION_CHARS {
            return Err(TaskDomainError::DescriptionTooLong(length));
        }
        Ok(Self(trimmed))
    }

    /// Returns the description as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskDescription {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
