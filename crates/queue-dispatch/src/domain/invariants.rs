//! # Domain Invariants
//!
//! Rules the handshake must hold regardless of which events arrive.

use std::collections::HashSet;

use super::entities::{Envelope, HandshakeSession};
use super::errors::{DeliveryStatus, HandshakeFailure};

/// Invariant: an envelope may only be transmitted over an established link
/// that has credit, and only while it is not already outstanding.
pub fn invariant_may_transmit(
    session: &HandshakeSession,
    credit: u32,
) -> Result<bool, HandshakeFailure> {
    if credit == 0 {
        return Err(HandshakeFailure::CreditUnavailable);
    }
    Ok(session.sender_link().is_some() && !session.is_sent())
}

/// Invariant: no two envelopes share a correlation id.
pub fn invariant_unique_correlation_ids<'a>(
    envelopes: impl IntoIterator<Item = &'a Envelope>,
) -> bool {
    let mut seen = HashSet::new();
    envelopes
        .into_iter()
        .all(|envelope| seen.insert(envelope.correlation_id()))
}

/// Outcome of a connection ending before acceptance was observed.
pub fn disconnect_failure(session: &HandshakeSession) -> HandshakeFailure {
    if session.is_sent() {
        HandshakeFailure::UnconfirmedDelivery
    } else if session.rejections() > 0 {
        HandshakeFailure::Rejected
    } else {
        HandshakeFailure::EarlyDisconnect
    }
}

/// Delivery knowledge for a handshake that ended in `failure`.
///
/// A transmission still outstanding makes the outcome unknown whatever the
/// failure was. With nothing outstanding, an earlier rejection is the last
/// word the broker gave on the message.
pub fn failure_delivery_status(
    session: &HandshakeSession,
    failure: &HandshakeFailure,
) -> DeliveryStatus {
    if session.is_sent() {
        DeliveryStatus::Unknown
    } else if session.rejections() > 0 {
        DeliveryStatus::Rejected
    } else {
        failure.delivery_status()
    }
}
