//! Unit tests for the task module.
//!
//! Tests are organised by layer: domain invariants first, then the task
//! store service over the in-memory repository.
