//! Concrete implementations of the chat persistence ports.

pub mod memory;
pub mod postgres;
