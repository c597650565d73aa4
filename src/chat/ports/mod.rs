//! Abstract ports for chat persistence.

pub mod repository;

pub use repository::{
    ChatRepositoryResult, ConversationRepository, MessageRepository, TurnDelta, TurnWriter,
};
