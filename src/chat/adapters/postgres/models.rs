//! Diesel row models for conversation and message persistence.

use super::schema::{conversations, messages};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for conversation records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = conversations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ConversationRow {
    /// Conversation identifier.
    pub id: uuid::Uuid,
    /// Owning-user identifier.
    pub user_id: uuid::Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest-activity timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for conversation records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = conversations)]
pub struct NewConversationRow {
    /// Conversation identifier.
    pub id: uuid::Uuid,
    /// Owning-user identifier.
    pub user_id: uuid::Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest-activity timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for message records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MessageRow {
    /// Message identifier.
    pub id: uuid::Uuid,
    /// Owning-user identifier.
    pub user_id: uuid::Uuid,
    /// Parent conversation identifier.
    pub conversation_id: uuid::Uuid,
    /// Message role.
    pub role: String,
    /// Message content.
    pub content: String,
    /// Sequence number within the conversation.
    pub sequence_number: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for message records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessageRow {
    /// Message identifier.
    pub id: uuid::Uuid,
    /// Owning-user identifier.
    pub user_id: uuid::Uuid,
    /// Parent conversation identifier.
    pub conversation_id: uuid::Uuid,
    /// Message role.
    pub role: String,
    /// Message content.
    pub content: String,
    /// Sequence number within the conversation.
    pub sequence_number: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
