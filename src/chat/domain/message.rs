//! Message aggregate root.
//!
//! Messages are append-only: once written they are never modified. Content
//! is validated at construction so no blank or oversized message can reach
//! a repository.

use super::{ConversationId, MessageId, Role, SequenceNumber};
use crate::identity::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum message content length in characters.
pub const MAX_MESSAGE_CHARS: usize = 10_000;

/// A single message within a conversation.
///
/// The owning-user identifier is denormalized onto every message so
/// isolation queries never need a join through the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    user_id: UserId,
    conversation_id: ConversationId,
    role: Role,
    content: String,
    sequence_number: SequenceNumber,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedMessageData {
    /// Persisted message identifier.
    pub id: MessageId,
    /// Persisted owning-user identifier.
    pub user_id: UserId,
    /// Persisted parent conversation identifier.
    pub conversation_id: ConversationId,
    /// Persisted role.
    pub role: Role,
    /// Persisted content.
    pub content: String,
    /// Persisted sequence number.
    pub sequence_number: SequenceNumber,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Creates a new message with the current timestamp.
    ///
    /// Content is trimmed before validation.
    ///
    /// # Errors
    ///
    /// Returns [`MessageContentError::Empty`] when the trimmed content is
    /// blank, or [`MessageContentError::TooLong`] when it exceeds
    /// [`MAX_MESSAGE_CHARS`].
    pub fn new(
        user_id: UserId,
        conversation_id: ConversationId,
        role: Role,
        content: impl Into<String>,
        sequence_number: SequenceNumber,
        clock: &impl Clock,
    ) -> Result<Self, MessageContentError> {
        let trimmed = content.into().trim().to_owned();
        if trimmed.is_empty() {
            return Err(MessageContentError::Empty);
        }
        let length = trimmed.chars().count();
        if length > MAX_MESSAGE_CHARS {
            return Err(MessageContentError::TooLong(length));
        }

        Ok(Self {
            id: MessageId::new(),
            user_id,
            conversation_id,
            role,
            content: trimmed,
            sequence_number,
            created_at: clock.utc(),
        })
    }

    /// Reconstructs a message from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedMessageData) -> Self {
        Self {
            id: data.id,
            user_id: data.user_id,
            conversation_id: data.conversation_id,
            role: data.role,
            content: data.content,
            sequence_number: data.sequence_number,
            created_at: data.created_at,
        }
    }

    /// Returns the message identifier.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the owning-user identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the parent conversation identifier.
    #[must_use]
    pub const fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    /// Returns the message role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns the message content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the sequence number within the conversation.
    #[must_use]
    pub const fn sequence_number(&self) -> SequenceNumber {
        self.sequence_number
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Errors returned while validating message content.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MessageContentError {
    /// The content is empty after trimming.
    #[error("message content must not be empty")]
    Empty,

    /// The content exceeds the maximum length.
    #[error("message content must be at most {MAX_MESSAGE_CHARS} characters, got {0}")]
    TooLong(usize),
}
