//! # Outbound Ports
//!
//! The broker transport and the correlation id source.
//!
//! A [`Connection`] is driven by pulling [`LinkEvent`]s from it one at a
//! time on a dedicated thread. Calls block.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::domain::{CorrelationId, Envelope, ErrorCondition, SenderLink, Target};

/// Lifecycle signal emitted by a broker connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    /// The connection's event loop started.
    Start,
    /// The sender link requested by the handshake is open.
    SenderOpened(SenderLink),
    /// The link is ready for sending and currently holds `credit`.
    Sendable {
        /// Messages the broker will currently accept on this link.
        credit: u32,
    },
    /// The broker accepted the outstanding message.
    Accepted,
    /// The broker rejected the outstanding message.
    Rejected,
    /// The socket went away.
    Disconnected,
    /// The transport underneath the connection failed.
    TransportError(ErrorCondition),
    /// The peer closed the connection with an error.
    ConnectionError(ErrorCondition),
    /// The peer closed the session with an error.
    SessionError(ErrorCondition),
    /// The peer closed the link with an error.
    LinkError(ErrorCondition),
}

/// Broker transport - outbound port.
///
/// Shared by every dispatch call; each call opens its own connection.
pub trait Transport: Send + Sync + 'static {
    /// Open a fresh connection to `target`.
    fn connect(&self, target: &Target) -> Result<Box<dyn Connection>, ErrorCondition>;
}

/// One broker connection, owned by a single handshake.
pub trait Connection: Send {
    /// Block until the next lifecycle event. `None` means the connection's
    /// event loop has finished and will produce nothing more.
    fn next_event(&mut self) -> Option<LinkEvent>;

    /// Open an outbound link to the target's destination.
    fn open_sender(&mut self, target: &Target) -> Result<SenderLink, ErrorCondition>;

    /// Transmit an envelope on the open sender link.
    fn send(&mut self, envelope: &Envelope) -> Result<(), ErrorCondition>;

    /// Close the connection.
    fn close(&mut self);
}

/// Correlation id source - outbound port.
pub trait IdSource: Send + Sync + 'static {
    /// A token never handed out before.
    fn next_id(&self) -> CorrelationId;
}

/// Random v4 UUID ids.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidSource;

impl IdSource for UuidSource {
    fn next_id(&self) -> CorrelationId {
        CorrelationId::new()
    }
}

/// Deterministic ids for tests: `00000000-0000-0000-0000-000000000001`, ...
#[derive(Debug, Default)]
pub struct SequentialIdSource {
    counter: AtomicU64,
}

impl IdSource for SequentialIdSource {
    fn next_id(&self) -> CorrelationId {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        CorrelationId::from_uuid(Uuid::from_u128(u128::from(n)))
    }
}
