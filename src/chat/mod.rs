//! Conversation and message persistence for stateless turn handling.
//!
//! The chat subsystem owns the durable dialogue record: conversations and
//! their append-only messages. It follows hexagonal architecture:
//!
//! - **Domain**: [`domain::Conversation`], [`domain::Message`], identifier
//!   newtypes, role parsing.
//! - **Ports**: [`ports::ConversationRepository`],
//!   [`ports::MessageRepository`], and [`ports::TurnWriter`] (the atomic
//!   one-turn append).
//! - **Adapters**: in-memory and `PostgreSQL` implementations.
//! - **Services**: [`services::TranscriptLoader`] (context reconstruction),
//!   [`services::TurnPersister`] (atomic turn append), and
//!   [`services::ConversationDirectory`] (administrative reads).

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
