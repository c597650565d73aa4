//! Application services for the task subsystem.

pub mod store;

pub use store::{CreateTaskRequest, TaskStore, TaskStoreError, UpdateTaskRequest};
