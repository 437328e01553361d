//! # Ports Module
//!
//! Hexagonal architecture ports: the capability callers consume (inbound)
//! and the transport and id source the dispatcher depends on (outbound).

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
