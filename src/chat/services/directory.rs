//! Administrative conversation reads: paginated listing and detail.
//!
//! Pure reads layered on the same ownership check as transcript loading.

use crate::chat::domain::{Conversation, ConversationId, Message};
use crate::chat::error::ChatRepositoryError;
use crate::chat::ports::repository::{ConversationRepository, MessageRepository};
use crate::identity::UserId;
use std::sync::Arc;
use thiserror::Error;

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Validated pagination parameters.
///
/// The limit is clamped to `1..=MAX_PAGE_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    limit: u32,
    offset: u32,
}

impl PageRequest {
    /// Creates a page request, clamping the limit into range.
    #[must_use]
    pub const fn new(limit: u32, offset: u32) -> Self {
        let clamped = if limit == 0 {
            1
        } else if limit > MAX_PAGE_LIMIT {
            MAX_PAGE_LIMIT
        } else {
            limit
        };
        Self {
            limit: clamped,
            offset,
        }
    }

    /// Returns the page size.
    #[must_use]
    pub const fn limit(self) -> u32 {
        self.limit
    }

    /// Returns the number of conversations skipped.
    #[must_use]
    pub const fn offset(self) -> u32 {
        self.offset
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(20, 0)
    }
}

/// One conversation in a listing, with its message count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    conversation: Conversation,
    message_count: u64,
}

impl ConversationSummary {
    /// Returns the conversation.
    #[must_use]
    pub const fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Returns the number of messages in the conversation.
    #[must_use]
    pub const fn message_count(&self) -> u64 {
        self.message_count
    }
}

/// A page of conversation summaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationPage {
    summaries: Vec<ConversationSummary>,
    total: u64,
    page: PageRequest,
}

impl ConversationPage {
    /// Returns the summaries on this page, newest activity first.
    #[must_use]
    pub fn summaries(&self) -> &[ConversationSummary] {
        &self.summaries
    }

    /// Returns the user's total conversation count.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Returns the pagination parameters that produced this page.
    #[must_use]
    pub const fn page(&self) -> PageRequest {
        self.page
    }
}

/// One conversation with its full ordered message history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationDetail {
    conversation: Conversation,
    messages: Vec<Message>,
}

impl ConversationDetail {
    /// Returns the conversation.
    #[must_use]
    pub const fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Returns the full message history, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

/// Errors returned by directory reads.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The conversation does not exist, or belongs to another user.
    /// The two are indistinguishable to callers.
    #[error("conversation not found: {0}")]
    NotFound(ConversationId),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] ChatRepositoryError),
}

/// Read service for conversation listings and detail views.
#[derive(Clone)]
pub struct ConversationDirectory<CV, MS>
where
    CV: ConversationRepository,
    MS: MessageRepository,
{
    conversations: Arc<CV>,
    messages: Arc<MS>,
}

impl<CV, MS> ConversationDirectory<CV, MS>
where
    CV: ConversationRepository,
    MS: MessageRepository,
{
    /// Creates a new conversation directory.
    #[must_use]
    pub const fn new(conversations: Arc<CV>, messages: Arc<MS>) -> Self {
        Self {
            conversations,
            messages,
        }
    }

    /// Lists the user's conversations, newest activity first.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Repository`] when a store read fails.
    pub async fn list(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<ConversationPage, DirectoryError> {
        let total = self.conversations.count_for_user(user_id).await?;
        let conversations = self
            .conversations
            .list_for_user(user_id, page.limit(), page.offset())
            .await?;

        let mut summaries = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let message_count = self
                .messages
                .count_for_conversation(conversation.id())
                .await?;
            summaries.push(ConversationSummary {
                conversation,
                message_count,
            });
        }

        Ok(ConversationPage {
            summaries,
            total,
            page,
        })
    }

    /// Fetches one conversation with its full message history.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] when the conversation is absent
    /// or owned by another user, or [`DirectoryError::Repository`] on store
    /// failure.
    pub async fn detail(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> Result<ConversationDetail, DirectoryError> {
        let conversation = self
            .conversations
            .find_by_id(conversation_id)
            .await?
            .filter(|conversation| conversation.is_owned_by(user_id))
            .ok_or(DirectoryError::NotFound(conversation_id))?;

        let messages = self.messages.find_by_conversation(conversation_id).await?;
        Ok(ConversationDetail {
            conversation,
            messages,
        })
    }
}
