//! Persistence ports for conversations, messages, and turn deltas.
//!
//! The turn delta is its own port because the append of one finished turn
//! (both messages plus the conversation bump) must be a single atomic unit
//! in every backend.

use crate::chat::domain::{Conversation, ConversationId, Message, SequenceNumber};
use crate::chat::error::ChatRepositoryError;
use crate::identity::UserId;
use async_trait::async_trait;

/// Result type for chat repository operations.
pub type ChatRepositoryResult<T> = Result<T, ChatRepositoryError>;

/// Port for conversation reads.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Finds a conversation by identifier.
    ///
    /// Returns `None` when the conversation does not exist. Ownership is
    /// checked by callers, never here.
    ///
    /// # Errors
    ///
    /// Returns [`ChatRepositoryError`] when the query fails.
    async fn find_by_id(
        &self,
        id: ConversationId,
    ) -> ChatRepositoryResult<Option<Conversation>>;

    /// Lists a user's conversations ordered by latest activity, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ChatRepositoryError`] when the query fails.
    async fn list_for_user(
        &self,
        user_id: UserId,
        limit: u32,
        offset: u32,
    ) -> ChatRepositoryResult<Vec<Conversation>>;

    /// Counts a user's conversations.
    ///
    /// # Errors
    ///
    /// Returns [`ChatRepositoryError`] when the query fails.
    async fn count_for_user(&self, user_id: UserId) -> ChatRepositoryResult<u64>;
}

/// Port for message reads.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Returns all messages of a conversation ordered oldest first by
    /// `(created_at, sequence_number)`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatRepositoryError`] when the query fails.
    async fn find_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> ChatRepositoryResult<Vec<Message>>;

    /// Counts the messages of a conversation.
    ///
    /// # Errors
    ///
    /// Returns [`ChatRepositoryError`] when the query fails.
    async fn count_for_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> ChatRepositoryResult<u64>;

    /// Returns the next free sequence number for a conversation.
    ///
    /// For a conversation with no messages this is `SequenceNumber::new(1)`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatRepositoryError`] when the query fails.
    async fn next_sequence_number(
        &self,
        conversation_id: ConversationId,
    ) -> ChatRepositoryResult<SequenceNumber>;
}

/// The transcript delta produced by one finished turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnDelta {
    /// The conversation the turn belongs to, with `updated_at` already
    /// bumped to the turn's finish time.
    pub conversation: Conversation,
    /// Whether the conversation was created by this turn.
    pub conversation_is_new: bool,
    /// The user's utterance.
    pub user_message: Message,
    /// The assistant's final reply.
    pub assistant_message: Message,
}

/// Port for atomically appending one turn to the store.
#[async_trait]
pub trait TurnWriter: Send + Sync {
    /// Applies the delta as a single atomic unit: both messages are inserted
    /// and the conversation row is created or its `updated_at` bumped, or
    /// nothing is persisted at all.
    ///
    /// # Errors
    ///
    /// Returns [`ChatRepositoryError`] when the write fails; on failure no
    /// part of the delta is visible to readers.
    async fn append_turn(&self, delta: &TurnDelta) -> ChatRepositoryResult<()>;
}
