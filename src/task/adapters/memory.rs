//! In-memory repository for task tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, RwLock};

use crate::identity::UserId;
use crate::task::{
    domain::{StatusFilter, Task, TaskId},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> TaskRepositoryError {
    TaskRepositoryError::persistence(io::Error::other(err.to_string()))
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut guard = self.tasks.write().map_err(lock_error)?;
        if guard.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        guard.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut guard = self.tasks.write().map_err(lock_error)?;
        if !guard.contains_key(&task.id()) {
            return Err(TaskRepositoryError::NotFound(task.id()));
        }
        guard.insert(task.id(), task.clone());
        Ok(())
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        let mut guard = self.tasks.write().map_err(lock_error)?;
        guard
            .remove(&id)
            .map(|_| ())
            .ok_or(TaskRepositoryError::NotFound(id))
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let guard = self.tasks.read().map_err(lock_error)?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        filter: StatusFilter,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let guard = self.tasks.read().map_err(lock_error)?;
        let mut tasks: Vec<Task> = guard
            .values()
            .filter(|task| task.is_owned_by(user_id) && task.matches(filter))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(tasks)
    }
}
