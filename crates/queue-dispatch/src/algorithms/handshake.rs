//! # Handshake State Machine
//!
//! Drives one envelope through connect, await credit, send, await
//! acceptance and close. The machine never touches the connection itself:
//! [`Handshake::handle`] consumes one [`LinkEvent`] and returns the action
//! the driver must perform next. Failures become a terminal state that the
//! driver checks after every event.
//!
//! ```text
//! Idle ──start──▶ Connecting ──opened──▶ AwaitingCredit ──sendable(credit)──▶ Sent ──accepted──▶ Accepted
//!                                              ▲                               │
//!                                              └────────────rejected───────────┘
//! any non-terminal ──disconnect / error / sendable(0)──▶ Failed(..)
//! ```

use adaptor_telemetry::log_dispatch_event;

use crate::domain::{
    disconnect_failure, invariant_may_transmit, CorrelationId, Envelope, HandshakeFailure,
    HandshakeSession, HandshakeState, SenderLink, Target,
};
use crate::ports::LinkEvent;

/// Work the driver must do on the connection after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandshakeAction {
    /// Open a sender link to the session's target.
    OpenSender,
    /// Transmit the session's envelope.
    Send,
    /// Close the connection.
    Close,
}

/// Finite state machine for delivering exactly one envelope.
#[derive(Debug)]
pub struct Handshake {
    session: HandshakeSession,
    state: HandshakeState,
}

impl Handshake {
    /// New machine in the `Idle` state.
    pub fn new(target: Target, envelope: Envelope) -> Self {
        Self {
            session: HandshakeSession::new(target, envelope),
            state: HandshakeState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> &HandshakeState {
        &self.state
    }

    /// Session data owned by this handshake.
    pub fn session(&self) -> &HandshakeSession {
        &self.session
    }

    /// `Some` once a terminal state is reached.
    pub fn outcome(&self) -> Option<Result<CorrelationId, HandshakeFailure>> {
        match &self.state {
            HandshakeState::Accepted => Some(Ok(self.correlation_id())),
            HandshakeState::Failed(failure) => Some(Err(failure.clone())),
            _ => None,
        }
    }

    /// Feed one event. Events arriving after a terminal state are ignored.
    pub fn handle(&mut self, event: LinkEvent) -> Option<HandshakeAction> {
        if self.state.is_terminal() {
            tracing::debug!(state = self.state.name(), ?event, "Ignoring event after handshake ended");
            return None;
        }

        match event {
            LinkEvent::Start => self.on_start(),
            LinkEvent::SenderOpened(link) => self.on_sender_opened(link),
            LinkEvent::Sendable { credit } => self.on_sendable(credit),
            LinkEvent::Accepted => self.on_accepted(),
            LinkEvent::Rejected => self.on_rejected(),
            LinkEvent::Disconnected => self.on_disconnected(),
            LinkEvent::TransportError(condition) => {
                self.fail(HandshakeFailure::TransportError(condition))
            }
            LinkEvent::ConnectionError(condition) => {
                self.fail(HandshakeFailure::ConnectionError(condition))
            }
            LinkEvent::SessionError(condition) => {
                self.fail(HandshakeFailure::SessionError(condition))
            }
            LinkEvent::LinkError(condition) => self.fail(HandshakeFailure::LinkError(condition)),
        }
    }

    fn correlation_id(&self) -> CorrelationId {
        self.session.envelope().correlation_id()
    }

    fn host(&self) -> &str {
        self.session.target.display_host()
    }

    fn on_start(&mut self) -> Option<HandshakeAction> {
        if self.state != HandshakeState::Idle {
            tracing::warn!(state = self.state.name(), "Duplicate start signal ignored");
            return None;
        }
        log_dispatch_event!(
            info,
            "Establishing connection for sending message",
            self.host(),
            self.correlation_id()
        );
        self.transition(HandshakeState::Connecting);
        Some(HandshakeAction::OpenSender)
    }

    fn on_sender_opened(&mut self, link: SenderLink) -> Option<HandshakeAction> {
        if self.state != HandshakeState::Connecting {
            tracing::warn!(state = self.state.name(), "Unexpected sender link ignored");
            return None;
        }
        tracing::debug!(address = %link.address, "Sender link established");
        self.session.establish_link(link);
        self.transition(HandshakeState::AwaitingCredit);
        None
    }

    /// Credit is only judged once a sender link exists; any sendable signal
    /// before that, zero credit included, is ignored.
    fn on_sendable(&mut self, credit: u32) -> Option<HandshakeAction> {
        if self.session.sender_link().is_none() {
            tracing::warn!(state = self.state.name(), credit, "Sendable before sender link opened");
            return None;
        }

        match invariant_may_transmit(&self.session, credit) {
            Err(failure) => self.fail(failure),
            Ok(false) => None,
            Ok(true) => {
                self.session.mark_sent();
                self.transition(HandshakeState::Sent);
                log_dispatch_event!(info, "Message sent", self.host(), self.correlation_id(), credit);
                Some(HandshakeAction::Send)
            }
        }
    }

    fn on_accepted(&mut self) -> Option<HandshakeAction> {
        if self.state != HandshakeState::Sent {
            tracing::warn!(state = self.state.name(), "Acceptance without outstanding message ignored");
            return None;
        }
        log_dispatch_event!(info, "Message received by broker", self.host(), self.correlation_id());
        self.transition(HandshakeState::Accepted);
        Some(HandshakeAction::Close)
    }

    fn on_rejected(&mut self) -> Option<HandshakeAction> {
        if self.state != HandshakeState::Sent {
            tracing::warn!(state = self.state.name(), "Rejection without outstanding message ignored");
            return None;
        }
        self.session.record_rejection();
        log_dispatch_event!(
            warn,
            "Message rejected by broker",
            self.host(),
            self.correlation_id(),
            rejections = self.session.rejections()
        );
        self.transition(HandshakeState::AwaitingCredit);
        None
    }

    fn on_disconnected(&mut self) -> Option<HandshakeAction> {
        log_dispatch_event!(
            info,
            "Disconnected from broker",
            self.host(),
            self.correlation_id(),
            sent = self.session.is_sent()
        );
        let failure = disconnect_failure(&self.session);
        self.fail(failure)
    }

    fn fail(&mut self, failure: HandshakeFailure) -> Option<HandshakeAction> {
        log_dispatch_event!(
            error,
            "Handshake failed",
            self.host(),
            self.correlation_id(),
            state = self.state.name(),
            failure = failure.kind(),
            detail = %failure
        );
        self.transition(HandshakeState::Failed(failure));
        None
    }

    fn transition(&mut self, next: HandshakeState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "invalid handshake transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::trace!(from = self.state.name(), to = next.name(), "Handshake transition");
        self.state = next;
    }
}
