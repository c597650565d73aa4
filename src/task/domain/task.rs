//! Task aggregate root and completion-status filtering.

use super::{ParseStatusFilterError, TaskDescription, TaskDomainError, TaskId, TaskTitle};
use crate::identity::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Completion-status filter for task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    /// All tasks regardless of status.
    #[default]
    All,
    /// Tasks not yet completed.
    Pending,
    /// Completed tasks.
    Completed,
}

impl StatusFilter {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl TryFrom<&str> for StatusFilter {
    type Error = ParseStatusFilterError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "all" => Ok(Self::All),
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseStatusFilterError(value.to_owned())),
        }
    }
}

/// Fields merged into a task by the update operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTaskFields {
    title: Option<TaskTitle>,
    description: Option<TaskDescription>,
}

impl UpdateTaskFields {
    /// Creates an empty field set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            title: None,
            description: None,
        }
    }

    /// Sets the replacement title.
    #[must_use]
    pub fn with_title(mut self, title: TaskTitle) -> Self {
        self.title = Some(title);
        self
    }

    /// Sets the replacement description.
    #[must_use]
    pub fn with_description(mut self, description: TaskDescription) -> Self {
        self.description = Some(description);
        self
    }

    /// Returns `true` when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

/// Task aggregate root.
///
/// Owned exclusively by one user and mutated only through the five task
/// store operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    user_id: UserId,
    title: TaskTitle,
    description: Option<TaskDescription>,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted owning-user identifier.
    pub user_id: UserId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted description, if any.
    pub description: Option<TaskDescription>,
    /// Persisted completion flag.
    pub completed: bool,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest-mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new, not-yet-completed task.
    #[must_use]
    pub fn new(
        user_id: UserId,
        title: TaskTitle,
        description: Option<TaskDescription>,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            user_id,
            title,
            description,
            completed: false,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            user_id: data.user_id,
            title: data.title,
            description: data.description,
            completed: data.completed,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning-user identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub const fn description(&self) -> Option<&TaskDescription> {
        self.description.as_ref()
    }

    /// Returns `true` when the task is completed.
    #[must_use]
    pub const fn completed(&self) -> bool {
        self.completed
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest-mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when the task belongs to the given user.
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Returns `true` when the task passes the given status filter.
    #[must_use]
    pub const fn matches(&self, filter: StatusFilter) -> bool {
        match filter {
            StatusFilter::All => true,
            StatusFilter::Pending => !self.completed,
            StatusFilter::Completed => self.completed,
        }
    }

    /// Marks the task completed.
    ///
    /// Completion is a level, not an edge: completing an already-completed
    /// task is a no-op that leaves `updated_at` untouched, so the operation
    /// is idempotent by value.
    pub fn complete(&mut self, clock: &impl Clock) {
        if !self.completed {
            self.completed = true;
            self.touch(clock);
        }
    }

    /// Merges updated fields into the task and bumps `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NoFieldsToUpdate`] when the field set is
    /// empty.
    pub fn apply_update(
        &mut self,
        fields: UpdateTaskFields,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if fields.is_empty() {
            return Err(TaskDomainError::NoFieldsToUpdate);
        }
        if let Some(title) = fields.title {
            self.title = title;
        }
        if let Some(description) = fields.description {
            self.description = Some(description);
        }
        self.touch(clock);
        Ok(())
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
