//! # Domain Errors
//!
//! Terminal handshake failures and the errors surfaced to dispatch callers.

use thiserror::Error;

use super::value_objects::{CorrelationId, ErrorCondition};

/// Why a handshake ended without broker acceptance.
///
/// Every variant is fatal to the single handshake attempt; nothing here is
/// retried by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeFailure {
    /// The link reported no credit when it became sendable.
    #[error("no link credit available to send the message")]
    CreditUnavailable,

    /// The broker rejected the message and the connection then ended
    /// without a further chance to resend.
    #[error("message rejected by the broker")]
    Rejected,

    /// The connection ended before the message was transmitted.
    #[error("disconnected before the message could be sent")]
    EarlyDisconnect,

    /// The message was transmitted but the connection ended before
    /// acceptance was observed. Delivery may or may not have happened.
    #[error("disconnected after sending but before acceptance was observed")]
    UnconfirmedDelivery,

    /// The transport underneath the connection failed.
    #[error("transport error: {0}")]
    TransportError(ErrorCondition),

    /// The peer closed the connection with an error condition.
    #[error("connection closed with error: {0}")]
    ConnectionError(ErrorCondition),

    /// The peer closed the session with an error condition.
    #[error("session closed with error: {0}")]
    SessionError(ErrorCondition),

    /// The peer closed the link with an error condition.
    #[error("link closed with error: {0}")]
    LinkError(ErrorCondition),
}

impl HandshakeFailure {
    /// What the caller can conclude about delivery when no transmission is
    /// outstanding and no rejection was seen. See
    /// [`failure_delivery_status`](super::invariants::failure_delivery_status)
    /// for the session-aware answer.
    pub fn delivery_status(&self) -> DeliveryStatus {
        match self {
            Self::Rejected => DeliveryStatus::Rejected,
            Self::UnconfirmedDelivery => DeliveryStatus::Unknown,
            _ => DeliveryStatus::NotDelivered,
        }
    }

    /// Short machine-readable name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreditUnavailable => "credit_unavailable",
            Self::Rejected => "rejected",
            Self::EarlyDisconnect => "early_disconnect",
            Self::UnconfirmedDelivery => "unconfirmed_delivery",
            Self::TransportError(_) => "transport_error",
            Self::ConnectionError(_) => "connection_error",
            Self::SessionError(_) => "session_error",
            Self::LinkError(_) => "link_error",
        }
    }
}

/// Delivery knowledge after a failed dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// The message never reached the broker.
    NotDelivered,
    /// The broker explicitly refused the message.
    Rejected,
    /// The message was transmitted but its fate is unknown.
    Unknown,
}

/// Errors returned to callers of the dispatch adaptor.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The message could not be converted into a wire body.
    #[error("Failed to serialise message: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The broker handshake ended without acceptance.
    #[error("Dispatch of {correlation_id} to {host} failed: {failure}")]
    Handshake {
        /// Broker endpoint the handshake targeted.
        host: String,
        /// Correlation id of the envelope.
        correlation_id: CorrelationId,
        /// Terminal failure reported by the state machine.
        failure: HandshakeFailure,
        /// Delivery knowledge at the moment the handshake failed.
        status: DeliveryStatus,
    },

    /// The worker thread running the handshake panicked or was cancelled.
    #[error("Dispatch worker terminated abnormally: {0}")]
    Worker(String),
}

impl DispatchError {
    /// The handshake failure, if this error came from the broker handshake.
    pub fn failure(&self) -> Option<&HandshakeFailure> {
        match self {
            Self::Handshake { failure, .. } => Some(failure),
            _ => None,
        }
    }

    /// What the caller can conclude about delivery.
    ///
    /// A worker that died mid-handshake may already have transmitted.
    pub fn delivery_status(&self) -> DeliveryStatus {
        match self {
            Self::Serialization(_) => DeliveryStatus::NotDelivered,
            Self::Handshake { status, .. } => *status,
            Self::Worker(_) => DeliveryStatus::Unknown,
        }
    }
}
