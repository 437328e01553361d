//! # Application Module
//!
//! Envelope construction, the blocking handshake driver and the async
//! dispatch service that bridges the two.

pub mod driver;
pub mod envelope_builder;
pub mod service;

pub use driver::{drive, run_handshake};
pub use envelope_builder::EnvelopeBuilder;
pub use service::QueueDispatchService;
