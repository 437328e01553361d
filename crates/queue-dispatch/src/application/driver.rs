//! # Handshake Driver
//!
//! Blocking loop that pumps connection events into a [`Handshake`] and
//! performs the actions it asks for. Runs on a worker thread.

use adaptor_telemetry::log_dispatch_event;

use crate::algorithms::{Handshake, HandshakeAction};
use crate::domain::{
    failure_delivery_status, CorrelationId, DeliveryStatus, DispatchError, Envelope,
    HandshakeFailure, Target,
};
use crate::ports::{Connection, LinkEvent, Transport};

/// Open one connection and drive one handshake for `envelope` to a terminal state.
pub fn run_handshake<T: Transport + ?Sized>(
    transport: &T,
    target: &Target,
    envelope: Envelope,
) -> Result<CorrelationId, DispatchError> {
    let correlation_id = envelope.correlation_id();
    let handshake_error = |failure: HandshakeFailure, status: DeliveryStatus| {
        DispatchError::Handshake {
            host: target.display_host().to_string(),
            correlation_id,
            failure,
            status,
        }
    };

    let mut connection = transport.connect(target).map_err(|condition| {
        log_dispatch_event!(
            error,
            "Failed to connect to broker",
            target.display_host(),
            correlation_id,
            condition = %condition
        );
        let failure = HandshakeFailure::ConnectionError(condition);
        let status = failure.delivery_status();
        handshake_error(failure, status)
    })?;

    let mut handshake = Handshake::new(target.clone(), envelope);
    drive(connection.as_mut(), &mut handshake).map_err(|failure| {
        let status = failure_delivery_status(handshake.session(), &failure);
        handshake_error(failure, status)
    })
}

/// Pump events until the handshake reaches a terminal state.
///
/// A connection whose event stream ends is treated as disconnected. The
/// connection is closed on every failure exit.
pub fn drive(
    connection: &mut dyn Connection,
    handshake: &mut Handshake,
) -> Result<CorrelationId, HandshakeFailure> {
    let mut feedback: Option<LinkEvent> = None;

    loop {
        let event = match feedback.take() {
            Some(event) => event,
            None => connection.next_event().unwrap_or_else(|| {
                tracing::debug!("Connection event loop finished");
                LinkEvent::Disconnected
            }),
        };

        if let Some(action) = handshake.handle(event) {
            feedback = perform(connection, handshake, action);
        }

        if let Some(outcome) = handshake.outcome() {
            if outcome.is_err() {
                connection.close();
            }
            return outcome;
        }
    }
}

/// Execute an action; a failing link operation comes back as a link error event.
fn perform(
    connection: &mut dyn Connection,
    handshake: &Handshake,
    action: HandshakeAction,
) -> Option<LinkEvent> {
    let session = handshake.session();
    match action {
        HandshakeAction::OpenSender => match connection.open_sender(&session.target) {
            Ok(link) => Some(LinkEvent::SenderOpened(link)),
            Err(condition) => Some(LinkEvent::LinkError(condition)),
        },
        HandshakeAction::Send => connection
            .send(session.envelope())
            .err()
            .map(LinkEvent::LinkError),
        HandshakeAction::Close => {
            connection.close();
            None
        }
    }
}
