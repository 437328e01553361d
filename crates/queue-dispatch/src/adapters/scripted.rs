//! Scripted Transport Adapter
//!
//! In-memory [`Transport`] that replays a fixed sequence of [`LinkEvent`]s
//! on every connection and records what the handshake did with it. Used
//! as the broker stand-in for tests and local runs.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::{Envelope, ErrorCondition, SenderLink, Target};
use crate::ports::{Connection, LinkEvent, Transport};

#[derive(Default)]
struct Recording {
    targets: Vec<Target>,
    sent: Vec<Envelope>,
    closes: usize,
}

/// Transport whose connections replay scripted events.
pub struct ScriptedTransport {
    /// Per-connection scripts, consumed in connect order.
    queued: Mutex<VecDeque<Vec<LinkEvent>>>,
    /// Script used once the queue is empty.
    default_script: Vec<LinkEvent>,
    connect_failure: Option<ErrorCondition>,
    open_sender_failure: Option<ErrorCondition>,
    send_failure: Option<ErrorCondition>,
    recording: Arc<Mutex<Recording>>,
}

impl ScriptedTransport {
    /// Every connection replays `script`.
    pub fn new(script: Vec<LinkEvent>) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            default_script: script,
            connect_failure: None,
            open_sender_failure: None,
            send_failure: None,
            recording: Arc::new(Mutex::new(Recording::default())),
        }
    }

    /// start → sendable(credit = 1) → accepted on every connection.
    pub fn accepting() -> Self {
        Self::new(vec![
            LinkEvent::Start,
            LinkEvent::Sendable { credit: 1 },
            LinkEvent::Accepted,
        ])
    }

    /// Every connect attempt fails with `condition`.
    pub fn refusing(condition: ErrorCondition) -> Self {
        let mut transport = Self::new(Vec::new());
        transport.connect_failure = Some(condition);
        transport
    }

    /// Queue a script for the next connection that has none yet.
    pub fn push_script(&self, script: Vec<LinkEvent>) {
        self.queued.lock().push_back(script);
    }

    /// Make `open_sender` fail.
    pub fn with_open_sender_failure(mut self, condition: ErrorCondition) -> Self {
        self.open_sender_failure = Some(condition);
        self
    }

    /// Make `send` fail.
    pub fn with_send_failure(mut self, condition: ErrorCondition) -> Self {
        self.send_failure = Some(condition);
        self
    }

    /// Envelopes transmitted so far, in transmission order.
    pub fn sent(&self) -> Vec<Envelope> {
        self.recording.lock().sent.clone()
    }

    /// Targets of every connection opened so far.
    pub fn targets(&self) -> Vec<Target> {
        self.recording.lock().targets.clone()
    }

    /// Number of connections opened.
    pub fn connections(&self) -> usize {
        self.recording.lock().targets.len()
    }

    /// Number of `close` calls across all connections.
    pub fn closes(&self) -> usize {
        self.recording.lock().closes
    }
}

impl Transport for ScriptedTransport {
    fn connect(&self, target: &Target) -> Result<Box<dyn Connection>, ErrorCondition> {
        if let Some(condition) = &self.connect_failure {
            return Err(condition.clone());
        }

        let script = self
            .queued
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.default_script.clone());
        self.recording.lock().targets.push(target.clone());

        Ok(Box::new(ScriptedConnection {
            events: script.into(),
            closed: false,
            open_sender_failure: self.open_sender_failure.clone(),
            send_failure: self.send_failure.clone(),
            recording: Arc::clone(&self.recording),
        }))
    }
}

struct ScriptedConnection {
    events: VecDeque<LinkEvent>,
    closed: bool,
    open_sender_failure: Option<ErrorCondition>,
    send_failure: Option<ErrorCondition>,
    recording: Arc<Mutex<Recording>>,
}

impl Connection for ScriptedConnection {
    fn next_event(&mut self) -> Option<LinkEvent> {
        if self.closed {
            return None;
        }
        self.events.pop_front()
    }

    fn open_sender(&mut self, target: &Target) -> Result<SenderLink, ErrorCondition> {
        match &self.open_sender_failure {
            Some(condition) => Err(condition.clone()),
            None => Ok(SenderLink::new(target.display_host())),
        }
    }

    fn send(&mut self, envelope: &Envelope) -> Result<(), ErrorCondition> {
        if let Some(condition) = &self.send_failure {
            return Err(condition.clone());
        }
        self.recording.lock().sent.push(envelope.clone());
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
        self.recording.lock().closes += 1;
    }
}
