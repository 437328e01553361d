//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implementations of the outbound transport port.

mod scripted;

pub use scripted::ScriptedTransport;
