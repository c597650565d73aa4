//! Transcript reconstruction for stateless turn handling.
//!
//! Each turn re-derives its context from the store: the loader checks
//! ownership, orders the prior messages oldest first, and truncates to the
//! most recent [`TRANSCRIPT_MESSAGE_CAP`] entries to bound prompt size.
//! Older context is dropped, not summarised.

use crate::chat::domain::{Conversation, ConversationId, Message};
use crate::chat::error::ChatRepositoryError;
use crate::chat::ports::repository::{ConversationRepository, MessageRepository};
use crate::identity::UserId;
use std::sync::Arc;
use thiserror::Error;

/// Maximum number of prior messages fed to the language capability.
pub const TRANSCRIPT_MESSAGE_CAP: usize = 50;

/// Errors returned while loading a transcript.
#[derive(Debug, Error)]
pub enum TranscriptError {
    /// The conversation does not exist.
    #[error("conversation not found: {0}")]
    NotFound(ConversationId),

    /// The conversation belongs to another user. Reported to callers as
    /// not-found so existence never leaks across ownership boundaries.
    #[error("conversation not owned by caller: {0}")]
    NotOwned(ConversationId),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] ChatRepositoryError),
}

/// A reconstructed dialogue context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    conversation: Option<Conversation>,
    messages: Vec<Message>,
}

impl Transcript {
    /// Returns the loaded conversation, when one existed.
    #[must_use]
    pub const fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    /// Returns the prior messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Consumes the transcript, returning its parts.
    #[must_use]
    pub fn into_parts(self) -> (Option<Conversation>, Vec<Message>) {
        (self.conversation, self.messages)
    }
}

/// Read-only service reconstructing dialogue context from the store.
#[derive(Clone)]
pub struct TranscriptLoader<CV, MS>
where
    CV: ConversationRepository,
    MS: MessageRepository,
{
    conversations: Arc<CV>,
    messages: Arc<MS>,
}

impl<CV, MS> TranscriptLoader<CV, MS>
where
    CV: ConversationRepository,
    MS: MessageRepository,
{
    /// Creates a new transcript loader.
    #[must_use]
    pub const fn new(conversations: Arc<CV>, messages: Arc<MS>) -> Self {
        Self {
            conversations,
            messages,
        }
    }

    /// Loads the transcript for a turn.
    ///
    /// With no conversation identifier the turn starts a new conversation:
    /// an empty transcript is returned and creation is deferred to the turn
    /// persister. This is a pure read; nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptError::NotFound`] when the conversation is
    /// absent, [`TranscriptError::NotOwned`] when it belongs to another
    /// user, or [`TranscriptError::Repository`] on store failure.
    pub async fn load(
        &self,
        user_id: UserId,
        conversation_id: Option<ConversationId>,
    ) -> Result<Transcript, TranscriptError> {
        let Some(id) = conversation_id else {
            return Ok(Transcript {
                conversation: None,
                messages: Vec::new(),
            });
        };

        let conversation = self
            .conversations
            .find_by_id(id)
            .await?
            .ok_or(TranscriptError::NotFound(id))?;
        if !conversation.is_owned_by(user_id) {
            return Err(TranscriptError::NotOwned(id));
        }

        let mut messages = self.messages.find_by_conversation(id).await?;
        if messages.len() > TRANSCRIPT_MESSAGE_CAP {
            messages = messages.split_off(messages.len() - TRANSCRIPT_MESSAGE_CAP);
        }

        Ok(Transcript {
            conversation: Some(conversation),
            messages,
        })
    }
}
