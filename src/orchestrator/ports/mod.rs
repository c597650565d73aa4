//! Port for the pluggable language capability.
//!
//! The capability is a black box: handed instructions, the transcript so
//! far, and the operation catalog, it answers with either a final reply or
//! exactly one requested operation. Its own retry and rate-limit handling
//! stays behind the port.

use crate::orchestrator::catalog::{OperationCall, ToolDefinition};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// One entry of the dialogue context handed to the capability.
///
/// Persisted messages become `User`/`Assistant` entries; tool exchanges
/// within the running turn are appended as `ToolCall`/`ToolResult` pairs and
/// stay ephemeral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    /// A user utterance.
    User(String),
    /// An assistant reply.
    Assistant(String),
    /// An operation the assistant requested earlier in this turn.
    ToolCall {
        /// Wire name of the operation.
        name: String,
        /// Arguments as dispatched.
        arguments: Value,
    },
    /// The structured result of a dispatched operation.
    ToolResult {
        /// Wire name of the operation.
        name: String,
        /// Structured result payload.
        payload: Value,
    },
}

/// Everything the capability sees for one resolution round.
#[derive(Debug, Clone, Copy)]
pub struct TurnPrompt<'a> {
    /// Rendered system instructions.
    pub instructions: &'a str,
    /// Dialogue context, oldest first.
    pub transcript: &'a [TranscriptEntry],
    /// Catalog of dispatchable operations.
    pub catalog: &'a [ToolDefinition],
}

/// The capability's answer for one resolution round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityAction {
    /// Final reply text; the turn finalises.
    Reply(String),
    /// Exactly one requested operation; the turn dispatches it.
    Invoke(OperationCall),
}

/// Failure of the language capability collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("language capability failure: {0}")]
pub struct CapabilityError(pub String);

/// Port for the natural-language reasoning collaborator.
#[async_trait]
pub trait LanguageCapability: Send + Sync {
    /// Returns the next action for the turn.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError`] when the collaborator is unavailable or
    /// produces an unusable answer.
    async fn next_action(&self, prompt: TurnPrompt<'_>) -> Result<CapabilityAction, CapabilityError>;
}
