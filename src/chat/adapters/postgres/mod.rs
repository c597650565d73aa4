//! `PostgreSQL` adapter for chat persistence.

pub mod models;
pub mod repository;
pub mod schema;

pub use repository::{ChatPgPool, PostgresChatStore};
