//! `PostgreSQL` persistence adapter for tasks.

pub mod models;
pub mod repository;
pub mod schema;

pub use repository::{PostgresTaskRepository, TaskPgPool};
