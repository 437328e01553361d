//! # Algorithms Module
//!
//! The handshake state machine.

pub mod handshake;

pub use handshake::{Handshake, HandshakeAction};
