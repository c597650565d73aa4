//! Unit tests for the orchestrator module.
//!
//! Tests are organised by concern: catalog parsing, reference resolution,
//! and reply rendering. The full turn state machine is exercised by the
//! integration suite over the in-memory adapters.
