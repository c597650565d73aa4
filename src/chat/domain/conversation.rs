//! Conversation aggregate root.

use super::ConversationId;
use crate::identity::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A conversation owned by a single user.
///
/// Conversations own an ordered sequence of messages and are created lazily
/// on the first turn when no identifier was supplied with the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedConversationData {
    /// Persisted conversation identifier.
    pub id: ConversationId,
    /// Persisted owning-user identifier.
    pub user_id: UserId,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest-activity timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Creates a new conversation for the given user.
    #[must_use]
    pub fn new(user_id: UserId, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: ConversationId::new(),
            user_id,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a conversation from persisted storage.
    #[must_use]
    pub const fn from_persisted(data: PersistedConversationData) -> Self {
        Self {
            id: data.id,
            user_id: data.user_id,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the conversation identifier.
    #[must_use]
    pub const fn id(&self) -> ConversationId {
        self.id
    }

    /// Returns the owning-user identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest-activity timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when the conversation belongs to the given user.
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Bumps the latest-activity timestamp to the current clock time.
    pub fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
