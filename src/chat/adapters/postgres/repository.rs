//! `PostgreSQL` implementation of the chat persistence ports.

use super::{
    models::{ConversationRow, MessageRow, NewConversationRow, NewMessageRow},
    schema::{conversations, messages},
};
use crate::chat::domain::{
    Conversation, ConversationId, Message, MessageId, PersistedConversationData,
    PersistedMessageData, Role, SequenceNumber,
};
use crate::chat::error::ChatRepositoryError;
use crate::chat::ports::repository::{
    ChatRepositoryResult, ConversationRepository, MessageRepository, TurnDelta, TurnWriter,
};
use crate::identity::UserId;
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};

/// `PostgreSQL` connection pool type used by chat adapters.
pub type ChatPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed store implementing all three chat ports.
#[derive(Debug, Clone)]
pub struct PostgresChatStore {
    pool: ChatPgPool,
}

impl PostgresChatStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: ChatPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ChatRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ChatRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ChatRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ChatRepositoryError::persistence)?
    }
}

#[async_trait]
impl ConversationRepository for PostgresChatStore {
    async fn find_by_id(
        &self,
        id: ConversationId,
    ) -> ChatRepositoryResult<Option<Conversation>> {
        self.run_blocking(move |connection| {
            let row = conversations::table
                .filter(conversations::id.eq(id.into_inner()))
                .select(ConversationRow::as_select())
                .first::<ConversationRow>(connection)
                .optional()
                .map_err(ChatRepositoryError::persistence)?;
            Ok(row.map(row_to_conversation))
        })
        .await
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        limit: u32,
        offset: u32,
    ) -> ChatRepositoryResult<Vec<Conversation>> {
        self.run_blocking(move |connection| {
            let rows = conversations::table
                .filter(conversations::user_id.eq(user_id.into_inner()))
                .order(conversations::updated_at.desc())
                .limit(i64::from(limit))
                .offset(i64::from(offset))
                .select(ConversationRow::as_select())
                .load::<ConversationRow>(connection)
                .map_err(ChatRepositoryError::persistence)?;
            Ok(rows.into_iter().map(row_to_conversation).collect())
        })
        .await
    }

    async fn count_for_user(&self, user_id: UserId) -> ChatRepositoryResult<u64> {
        self.run_blocking(move |connection| {
            let count = conversations::table
                .filter(conversations::user_id.eq(user_id.into_inner()))
                .count()
                .get_result::<i64>(connection)
                .map_err(ChatRepositoryError::persistence)?;
            u64::try_from(count).map_err(ChatRepositoryError::persistence)
        })
        .await
    }
}

#[async_trait]
impl MessageRepository for PostgresChatStore {
    async fn find_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> ChatRepositoryResult<Vec<Message>> {
        self.run_blocking(move |connection| {
            let rows = messages::table
                .filter(messages::conversation_id.eq(conversation_id.into_inner()))
                .order((messages::created_at.asc(), messages::sequence_number.asc()))
                .select(MessageRow::as_select())
                .load::<MessageRow>(connection)
                .map_err(ChatRepositoryError::persistence)?;
            rows.into_iter().map(row_to_message).collect()
        })
        .await
    }

    async fn count_for_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> ChatRepositoryResult<u64> {
        self.run_blocking(move |connection| {
            let count = messages::table
                .filter(messages::conversation_id.eq(conversation_id.into_inner()))
                .count()
                .get_result::<i64>(connection)
                .map_err(ChatRepositoryError::persistence)?;
            u64::try_from(count).map_err(ChatRepositoryError::persistence)
        })
        .await
    }

    async fn next_sequence_number(
        &self,
        conversation_id: ConversationId,
    ) -> ChatRepositoryResult<SequenceNumber> {
        self.run_blocking(move |connection| {
            let highest = messages::table
                .filter(messages::conversation_id.eq(conversation_id.into_inner()))
                .select(diesel::dsl::max(messages::sequence_number))
                .first::<Option<i64>>(connection)
                .map_err(ChatRepositoryError::persistence)?;
            match highest {
                Some(value) => {
                    let current =
                        u64::try_from(value).map_err(ChatRepositoryError::persistence)?;
                    Ok(SequenceNumber::new(current).next())
                }
                None => Ok(SequenceNumber::new(1)),
            }
        })
        .await
    }
}

#[async_trait]
impl TurnWriter for PostgresChatStore {
    async fn append_turn(&self, delta: &TurnDelta) -> ChatRepositoryResult<()> {
        let conversation_row = to_conversation_row(&delta.conversation);
        let conversation_is_new = delta.conversation_is_new;
        let user_row = to_message_row(&delta.user_message)?;
        let assistant_row = to_message_row(&delta.assistant_message)?;
        let conversation_id = delta.conversation.id();
        let bumped_at = delta.conversation.updated_at();

        self.run_blocking(move |connection| {
            connection
                .transaction::<(), diesel::result::Error, _>(|conn| {
                    if conversation_is_new {
                        diesel::insert_into(conversations::table)
                            .values(&conversation_row)
                            .execute(conn)?;
                    } else {
                        diesel::update(
                            conversations::table
                                .filter(conversations::id.eq(conversation_id.into_inner())),
                        )
                        .set(conversations::updated_at.eq(bumped_at))
                        .execute(conn)?;
                    }

                    diesel::insert_into(messages::table)
                        .values(&user_row)
                        .execute(conn)?;
                    diesel::insert_into(messages::table)
                        .values(&assistant_row)
                        .execute(conn)?;
                    Ok(())
                })
                .map_err(ChatRepositoryError::persistence)
        })
        .await
    }
}

fn row_to_conversation(row: ConversationRow) -> Conversation {
    Conversation::from_persisted(PersistedConversationData {
        id: ConversationId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn row_to_message(row: MessageRow) -> ChatRepositoryResult<Message> {
    let role = Role::try_from(row.role.as_str()).map_err(ChatRepositoryError::persistence)?;
    let sequence =
        u64::try_from(row.sequence_number).map_err(ChatRepositoryError::persistence)?;
    Ok(Message::from_persisted(PersistedMessageData {
        id: MessageId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        conversation_id: ConversationId::from_uuid(row.conversation_id),
        role,
        content: row.content,
        sequence_number: SequenceNumber::new(sequence),
        created_at: row.created_at,
    }))
}

fn to_conversation_row(conversation: &Conversation) -> NewConversationRow {
    NewConversationRow {
        id: conversation.id().into_inner(),
        user_id: conversation.user_id().into_inner(),
        created_at: conversation.created_at(),
        updated_at: conversation.updated_at(),
    }
}

fn to_message_row(message: &Message) -> ChatRepositoryResult<NewMessageRow> {
    let sequence = i64::try_from(message.sequence_number().value())
        .map_err(ChatRepositoryError::persistence)?;
    Ok(NewMessageRow {
        id: message.id().into_inner(),
        user_id: message.user_id().into_inner(),
        conversation_id: message.conversation_id().into_inner(),
        role: message.role().as_str().to_owned(),
        content: message.content().to_owned(),
        sequence_number: sequence,
        created_at: message.created_at(),
    })
}
