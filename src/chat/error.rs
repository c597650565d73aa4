//! Repository error type shared by chat persistence ports.

use super::domain::{ConversationId, MessageId};
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by chat repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ChatRepositoryError {
    /// A conversation with the same identifier already exists.
    #[error("duplicate conversation identifier: {0}")]
    DuplicateConversation(ConversationId),

    /// A message with the same identifier already exists.
    #[error("duplicate message identifier: {0}")]
    DuplicateMessage(MessageId),

    /// A turn delta referenced a conversation that is not stored.
    #[error("conversation not found: {0}")]
    ConversationMissing(ConversationId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ChatRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
