//! # Domain Module
//!
//! Core types for single-message dispatch: the envelope, the handshake
//! session, its states and failure vocabulary.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use value_objects::*;
