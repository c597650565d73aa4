//! Stateless turn orchestration: intent resolution and tool dispatch.
//!
//! The orchestrator turns one user utterance into a completed conversational
//! turn. It follows hexagonal architecture:
//!
//! - Operation catalog in [`catalog`]: the closed union of dispatchable
//!   task operations and their JSON tool definitions.
//! - Port contract in [`ports`]: the pluggable language capability.
//! - Adapter implementations in [`adapters`].
//! - Pure helpers in [`resolver`] (phrase-to-task matching), [`reply`]
//!   (deterministic user-facing text), and [`prompt`] (instruction
//!   rendering).
//! - The bounded turn state machine in [`turn`].

pub mod adapters;
pub mod catalog;
pub mod ports;
pub mod prompt;
pub mod reply;
pub mod resolver;
pub mod turn;

#[cfg(test)]
mod tests;
