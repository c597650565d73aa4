//! Error types for task domain validation.

use thiserror::Error;

/// Errors returned while constructing or mutating domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The title exceeds the maximum length.
    #[error("task title must be at most 200 characters, got {0}")]
    TitleTooLong(usize),

    /// The description exceeds the maximum length.
    #[error("task description must be at most 2000 characters, got {0}")]
    DescriptionTooLong(usize),

    /// An update supplied no fields to change.
    #[error("at least one of title or description must be provided")]
    NoFieldsToUpdate,
}

/// Error returned while parsing status filters from their string form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown status filter: {0}")]
pub struct ParseStatusFilterError(pub String);
