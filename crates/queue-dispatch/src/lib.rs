//! # Queue Dispatch
//!
//! Hands a single application message to a message broker over a
//! connection-oriented, credit-flow-controlled link and reports the
//! broker's verdict to an async caller.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Flow
//!
//! ```text
//! caller ──send_async──▶ QueueDispatchService ──build──▶ Envelope
//!                               │
//!                        spawn_blocking
//!                               ▼
//!             connect ─▶ Handshake::handle(event)* ─▶ accepted / failure
//! ```
//!
//! Every call opens its own connection and drives its own [`Handshake`].
//! There is no pooling, batching, retry or timeout: a broker that never
//! answers stalls that call's worker thread.
//!
//! ## Module Structure
//!
//! ```text
//! queue-dispatch/
//! ├── domain/          # Envelope, HandshakeSession, states, errors, invariants
//! ├── algorithms/      # Handshake state machine
//! ├── ports/           # QueueAdaptor (inbound), Transport/Connection/IdSource (outbound)
//! ├── application/     # EnvelopeBuilder, blocking driver, QueueDispatchService
//! ├── adapters/        # ScriptedTransport
//! └── config.rs        # QueueAdaptorConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::ScriptedTransport;
pub use algorithms::{Handshake, HandshakeAction};
pub use application::{drive, run_handshake, EnvelopeBuilder, QueueDispatchService};
pub use config::QueueAdaptorConfig;
pub use domain::{
    ApplicationProperties, CorrelationId, Credentials, DeliveryStatus, DispatchError, Envelope,
    ErrorCondition, HandshakeFailure, HandshakeSession, HandshakeState, SenderLink, Target,
    CONTENT_TYPE_JSON,
};
pub use ports::{
    Connection, DeliveryReceipt, IdSource, LinkEvent, QueueAdaptor, SequentialIdSource,
    Transport, UuidSource,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
