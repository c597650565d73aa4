//! Domain types for the chat subsystem.
//!
//! Pure types with no infrastructure dependencies: conversation and message
//! aggregates, identifier newtypes, and role parsing.

mod conversation;
mod ids;
mod message;
mod role;

pub use conversation::{Conversation, PersistedConversationData};
pub use ids::{ConversationId, MessageId, SequenceNumber};
pub use message::{MAX_MESSAGE_CHARS, Message, MessageContentError, PersistedMessageData};
pub use role::{ParseRoleError, Role};
