//! Adapters implementing the language-capability port.

pub mod scripted;

pub use scripted::ScriptedCapability;
