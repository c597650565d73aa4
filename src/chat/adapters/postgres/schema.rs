//! Diesel schema for conversation and message persistence.

diesel::table! {
    /// Conversation records owned by a single user.
    conversations (id) {
        /// Conversation identifier.
        id -> Uuid,
        /// Owning-user identifier.
        user_id -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Latest-activity timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only message records.
    messages (id) {
        /// Message identifier.
        id -> Uuid,
        /// Owning-user identifier, denormalized for isolation queries.
        user_id -> Uuid,
        /// Parent conversation identifier.
        conversation_id -> Uuid,
        /// Message role (`user` or `assistant`).
        #[max_length = 20]
        role -> Varchar,
        /// Message content.
        content -> Text,
        /// Sequence number within the conversation.
        sequence_number -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(conversations, messages);
