//! Application service exposing the five task operations.
//!
//! Every operation takes the acting user's identity as an explicit
//! parameter and enforces ownership before touching a task. Tasks owned by
//! another user are reported as not found so existence is never leaked.

use crate::identity::UserId;
use crate::task::{
    domain::{
        StatusFilter, Task, TaskDescription, TaskDomainError, TaskId, TaskTitle, UpdateTaskFields,
    },
    ports::{TaskRepository, TaskRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by the task store operations.
#[derive(Debug, Error)]
pub enum TaskStoreError {
    /// The task does not exist for the acting user.
    ///
    /// Also covers tasks owned by someone else; ownership failures are
    /// indistinguishable from absence at this boundary.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A field failed domain validation.
    #[error(transparent)]
    Validation(#[from] TaskDomainError),

    /// The underlying repository failed.
    #[error("task repository failure: {0}")]
    Repository(#[from] TaskRepositoryError),
}

/// Request to create a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: Option<String>,
}

impl CreateTaskRequest {
    /// Creates a request with the given title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }

    /// Sets the optional description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Request to update an existing task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    title: Option<String>,
    description: Option<String>,
}

impl UpdateTaskRequest {
    /// Creates an empty update request.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            title: None,
            description: None,
        }
    }

    /// Sets the replacement title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the replacement description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns `true` when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

/// Application service for task management.
#[derive(Debug)]
pub struct TaskStore<R, C> {
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> Clone for TaskStore<R, C> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, C> TaskStore<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a store over the given repository and clock.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Creates a task for the acting user.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Validation`] when the title or description
    /// fail validation, or [`TaskStoreError::Repository`] on persistence
    /// failure.
    pub async fn create(
        &self,
        user_id: UserId,
        request: CreateTaskRequest,
    ) -> Result<Task, TaskStoreError> {
        let title = TaskTitle::new(request.title)?;
        let description = normalize_description(request.description)?;
        let task = Task::new(user_id, title, description, self.clock.as_ref());
        self.repository.insert(&task).await?;
        Ok(task)
    }

    /// Lists the acting user's tasks matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Repository`] on persistence failure.
    pub async fn list(
        &self,
        user_id: UserId,
        filter: StatusFilter,
    ) -> Result<Vec<Task>, TaskStoreError> {
        Ok(self.repository.list_for_user(user_id, filter).await?)
    }

    /// Finds one of the acting user's tasks by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist or
    /// belongs to another user.
    pub async fn get(&self, user_id: UserId, id: TaskId) -> Result<Task, TaskStoreError> {
        self.find_owned(user_id, id).await
    }

    /// Marks one of the acting user's tasks completed.
    ///
    /// Completing an already-completed task succeeds without rewriting the
    /// stored record.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist or
    /// belongs to another user.
    pub async fn complete(&self, user_id: UserId, id: TaskId) -> Result<Task, TaskStoreError> {
        let mut task = self.find_owned(user_id, id).await?;
        if task.completed() {
            return Ok(task);
        }
        task.complete(self.clock.as_ref());
        self.write_back(&task).await?;
        Ok(task)
    }

    /// Deletes one of the acting user's tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist or
    /// belongs to another user.
    pub async fn delete(&self, user_id: UserId, id: TaskId) -> Result<Task, TaskStoreError> {
        let task = self.find_owned(user_id, id).await?;
        match self.repository.delete(id).await {
            Ok(()) => Ok(task),
            Err(TaskRepositoryError::NotFound(_)) => Err(TaskStoreError::NotFound(id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Updates title and/or description of one of the acting user's tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist or
    /// belongs to another user, and [`TaskStoreError::Validation`] when the
    /// request carries no fields or a field fails validation.
    pub async fn update(
        &self,
        user_id: UserId,
        id: TaskId,
        request: UpdateTaskRequest,
    ) -> Result<Task, TaskStoreError> {
        if request.is_empty() {
            return Err(TaskDomainError::NoFieldsToUpdate.into());
        }
        let mut fields = UpdateTaskFields::new();
        if let Some(title) = request.title {
            fields = fields.with_title(TaskTitle::new(title)?);
        }
        if let Some(raw_description) = request.description {
            if let Some(description) = normalize_description(Some(raw_description))? {
                fields = fields.with_description(description);
            }
        }
        if fields.is_empty() {
            return Err(TaskDomainError::NoFieldsToUpdate.into());
        }

        let mut task = self.find_owned(user_id, id).await?;
        task.apply_update(fields, self.clock.as_ref())?;
        self.write_back(&task).await?;
        Ok(task)
    }

    async fn find_owned(&self, user_id: UserId, id: TaskId) -> Result<Task, TaskStoreError> {
        let task = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(TaskStoreError::NotFound(id))?;
        if !task.is_owned_by(user_id) {
            return Err(TaskStoreError::NotFound(id));
        }
        Ok(task)
    }

    async fn write_back(&self, task: &Task) -> Result<(), TaskStoreError> {
        match self.repository.update(task).await {
            Ok(()) => Ok(()),
            Err(TaskRepositoryError::NotFound(id)) => Err(TaskStoreError::NotFound(id)),
            Err(err) => Err(err.into()),
        }
    }
}

fn normalize_description(
    raw: Option<String>,
) -> Result<Option<TaskDescription>, TaskDomainError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let description = TaskDescription::new(raw)?;
    if description.as_str().is_empty() {
        return Ok(None);
    }
    Ok(Some(description))
}
