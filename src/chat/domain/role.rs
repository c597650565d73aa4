//! Message role within a persisted conversation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The source of a persisted message.
///
/// Only user utterances and final assistant replies are persisted; tool
/// exchanges within a turn stay ephemeral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A message written by the user.
    User,
    /// A message produced by the assistant.
    Assistant,
}

impl Role {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = ParseRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(ParseRoleError(value.to_owned())),
        }
    }
}

/// Error returned while parsing roles from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown message role: {0}")]
pub struct ParseRoleError(pub String);
