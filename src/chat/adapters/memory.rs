//! In-memory implementation of the chat persistence ports.
//!
//! Thread-safe via an internal [`RwLock`]; the turn append takes the write
//! lock once, so the delta is atomic with respect to every reader. Suitable
//! for tests only.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::chat::domain::{Conversation, ConversationId, Message, MessageId, SequenceNumber};
use crate::chat::error::ChatRepositoryError;
use crate::chat::ports::repository::{
    ChatRepositoryResult, ConversationRepository, MessageRepository, TurnDelta, TurnWriter,
};
use crate::identity::UserId;

/// In-memory store implementing all three chat ports.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChatStore {
    state: Arc<RwLock<ChatState>>,
}

#[derive(Debug, Default)]
struct ChatState {
    conversations: HashMap<ConversationId, Conversation>,
    messages: HashMap<MessageId, Message>,
}

impl InMemoryChatStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> ChatRepositoryResult<std::sync::RwLockReadGuard<'_, ChatState>> {
        self.state
            .read()
            .map_err(|err| ChatRepositoryError::persistence(io::Error::other(err.to_string())))
    }
}

fn ordered_conversation_messages(state: &ChatState, id: ConversationId) -> Vec<Message> {
    let mut messages: Vec<Message> = state
        .messages
        .values()
        .filter(|message| message.conversation_id() == id)
        .cloned()
        .collect();
    messages.sort_by_key(|message| (message.created_at(), message.sequence_number()));
    messages
}

#[async_trait]
impl ConversationRepository for InMemoryChatStore {
    async fn find_by_id(
        &self,
        id: ConversationId,
    ) -> ChatRepositoryResult<Option<Conversation>> {
        let state = self.read_state()?;
        Ok(state.conversations.get(&id).cloned())
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        limit: u32,
        offset: u32,
    ) -> ChatRepositoryResult<Vec<Conversation>> {
        let state = self.read_state()?;
        let mut conversations: Vec<Conversation> = state
            .conversations
            .values()
            .filter(|conversation| conversation.is_owned_by(user_id))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        let skip = usize::try_from(offset).map_err(ChatRepositoryError::persistence)?;
        let take = usize::try_from(limit).map_err(ChatRepositoryError::persistence)?;
        Ok(conversations.into_iter().skip(skip).take(take).collect())
    }

    async fn count_for_user(&self, user_id: UserId) -> ChatRepositoryResult<u64> {
        let state = self.read_state()?;
        let count = state
            .conversations
            .values()
            .filter(|conversation| conversation.is_owned_by(user_id))
            .count();
        u64::try_from(count).map_err(ChatRepositoryError::persistence)
    }
}

#[async_trait]
impl MessageRepository for InMemoryChatStore {
    async fn find_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> ChatRepositoryResult<Vec<Message>> {
        let state = self.read_state()?;
        Ok(ordered_conversation_messages(&state, conversation_id))
    }

    async fn count_for_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> ChatRepositoryResult<u64> {
        let state = self.read_state()?;
        let count = state
            .messages
            .values()
            .filter(|message| message.conversation_id() == conversation_id)
            .count();
        u64::try_from(count).map_err(ChatRepositoryError::persistence)
    }

    async fn next_sequence_number(
        &self,
        conversation_id: ConversationId,
    ) -> ChatRepositoryResult<SequenceNumber> {
        let state = self.read_state()?;
        let highest = state
            .messages
            .values()
            .filter(|message| message.conversation_id() == conversation_id)
            .map(|message| message.sequence_number())
            .max();
        Ok(highest.map_or(SequenceNumber::new(1), SequenceNumber::next))
    }
}

#[async_trait]
impl TurnWriter for InMemoryChatStore {
    async fn append_turn(&self, delta: &TurnDelta) -> ChatRepositoryResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ChatRepositoryError::persistence(io::Error::other(err.to_string())))?;

        let conversation_id = delta.conversation.id();
        if delta.conversation_is_new {
            if state.conversations.contains_key(&conversation_id) {
                return Err(ChatRepositoryError::DuplicateConversation(conversation_id));
            }
        } else if !state.conversations.contains_key(&conversation_id) {
            return Err(ChatRepositoryError::ConversationMissing(conversation_id));
        }

        for message in [&delta.user_message, &delta.assistant_message] {
            if state.messages.contains_key(&message.id()) {
                return Err(ChatRepositoryError::DuplicateMessage(message.id()));
            }
        }

        // All checks passed: apply the whole delta under the single write
        // lock so readers never observe a partial turn.
        state
            .conversations
            .insert(conversation_id, delta.conversation.clone());
        state
            .messages
            .insert(delta.user_message.id(), delta.user_message.clone());
        state.messages.insert(
            delta.assistant_message.id(),
            delta.assistant_message.clone(),
        );
        Ok(())
    }
}
