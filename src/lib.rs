//! Factotum: conversational task management over a stateless turn engine.
//!
//! This crate turns free-form natural-language chat into task-list
//! mutations: it reconstructs dialogue context from the durable store,
//! resolves the user's intent against a closed catalog of five task
//! operations, dispatches them under ownership isolation, and persists
//! each finished turn atomically. No session state survives between
//! requests; every turn re-derives truth from the store.
//!
//! # Architecture
//!
//! Factotum follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, test
//!   stand-ins)
//!
//! # Modules
//!
//! - [`chat`]: Conversation and message persistence, transcript loading,
//!   atomic turn appends, and administrative conversation reads
//! - [`task`]: The task aggregate and the five-operation task store
//! - [`orchestrator`]: The bounded turn state machine, operation catalog,
//!   reference resolver, and reply rendering
//! - [`identity`]: The identity-verifier port trusted for every ownership
//!   decision

pub mod chat;
pub mod identity;
pub mod orchestrator;
pub mod task;
