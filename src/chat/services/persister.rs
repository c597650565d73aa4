//! Atomic persistence of a finished turn.
//!
//! Runs after the turn has been finalised, never before: a failed tool
//! dispatch still produces an assistant message (the error text), so
//! transcript continuity survives into the next turn.

use crate::chat::domain::{Conversation, Message, MessageContentError, Role};
use crate::chat::error::ChatRepositoryError;
use crate::chat::ports::repository::{MessageRepository, TurnDelta, TurnWriter};
use crate::identity::UserId;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned while persisting a turn.
#[derive(Debug, Error)]
pub enum PersistTurnError {
    /// A message failed content validation.
    #[error(transparent)]
    Content(#[from] MessageContentError),

    /// The atomic append failed; no part of the turn was persisted.
    #[error(transparent)]
    Repository(#[from] ChatRepositoryError),
}

/// Service appending one turn to the conversation record.
#[derive(Clone)]
pub struct TurnPersister<W, MS, C>
where
    W: TurnWriter,
    MS: MessageRepository,
    C: Clock + Send + Sync,
{
    writer: Arc<W>,
    messages: Arc<MS>,
    clock: Arc<C>,
}

impl<W, MS, C> TurnPersister<W, MS, C>
where
    W: TurnWriter,
    MS: MessageRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new turn persister.
    #[must_use]
    pub const fn new(writer: Arc<W>, messages: Arc<MS>, clock: Arc<C>) -> Self {
        Self {
            writer,
            messages,
            clock,
        }
    }

    /// Persists the turn delta: the user utterance, the assistant reply,
    /// and the conversation bump, atomically.
    ///
    /// Creates the conversation when none existed. Sequence numbers are
    /// assigned here, consecutively, so the pair sorts correctly even when
    /// both messages share a timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`PersistTurnError::Content`] when either message fails
    /// validation, or [`PersistTurnError::Repository`] when the atomic
    /// append fails, in which case neither message was persisted.
    pub async fn persist(
        &self,
        user_id: UserId,
        prior: Option<Conversation>,
        utterance: &str,
        reply: &str,
    ) -> Result<Conversation, PersistTurnError> {
        let conversation_is_new = prior.is_none();
        let mut conversation = prior.unwrap_or_else(|| Conversation::new(user_id, &*self.clock));

        let sequence = self
            .messages
            .next_sequence_number(conversation.id())
            .await?;
        let user_message = Message::new(
            user_id,
            conversation.id(),
            Role::User,
            utterance,
            sequence,
            &*self.clock,
        )?;
        let assistant_message = Message::new(
            user_id,
            conversation.id(),
            Role::Assistant,
            reply,
            sequence.next(),
            &*self.clock,
        )?;
        conversation.touch(&*self.clock);

        let delta = TurnDelta {
            conversation: conversation.clone(),
            conversation_is_new,
            user_message,
            assistant_message,
        };
        self.writer.append_turn(&delta).await?;
        Ok(conversation)
    }
}
