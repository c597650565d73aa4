//! Unit tests for the chat module.
//!
//! Tests are organised by layer: domain invariants, transcript loading,
//! turn persistence, and the conversation directory, all over the in-memory
//! store.
