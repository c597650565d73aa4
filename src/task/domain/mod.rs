//! Domain types for the task subsystem.

mod error;
mod ids;
mod task;

pub use error::{ParseStatusFilterError, TaskDomainError};
pub use ids::{MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS, TaskDescription, TaskId, TaskTitle};
pub use task::{PersistedTaskData, StatusFilter, Task, UpdateTaskFields};
