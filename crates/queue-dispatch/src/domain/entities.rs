//! # Domain Entities
//!
//! The outbound envelope and the per-call handshake session that owns it.

use serde::de::DeserializeOwned;

use super::value_objects::{ApplicationProperties, CorrelationId, SenderLink, Target};

/// Fully formed outbound message. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    correlation_id: CorrelationId,
    content_type: String,
    body: Vec<u8>,
    properties: Option<ApplicationProperties>,
}

impl Envelope {
    /// Assemble an envelope from its parts.
    pub fn new(
        correlation_id: CorrelationId,
        content_type: impl Into<String>,
        body: Vec<u8>,
        properties: Option<ApplicationProperties>,
    ) -> Self {
        Self {
            correlation_id,
            content_type: content_type.into(),
            body,
            properties,
        }
    }

    /// Correlation id generated for this envelope.
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// MIME type of the body.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Wire body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Application properties, if any were supplied.
    pub fn properties(&self) -> Option<&ApplicationProperties> {
        self.properties.as_ref()
    }

    /// Decode a JSON body back into a value.
    pub fn decode_body<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// State owned by exactly one handshake.
///
/// `sent` only becomes true while a sender link is established. It is
/// cleared again when the broker rejects the message.
#[derive(Debug)]
pub struct HandshakeSession {
    /// Endpoint this session connects to.
    pub target: Target,
    envelope: Envelope,
    sent: bool,
    sender_link: Option<SenderLink>,
    rejections: u32,
}

impl HandshakeSession {
    /// Fresh session for one envelope.
    pub fn new(target: Target, envelope: Envelope) -> Self {
        Self {
            target,
            envelope,
            sent: false,
            sender_link: None,
            rejections: 0,
        }
    }

    /// The envelope being delivered.
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Whether the envelope is currently transmitted and unresolved.
    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// The established sender link, if any.
    pub fn sender_link(&self) -> Option<&SenderLink> {
        self.sender_link.as_ref()
    }

    /// Number of broker rejections seen so far.
    pub fn rejections(&self) -> u32 {
        self.rejections
    }

    /// Record the outbound link.
    pub fn establish_link(&mut self, link: SenderLink) {
        self.sender_link = Some(link);
    }

    /// Record a transmission.
    pub fn mark_sent(&mut self) {
        self.sent = true;
    }

    /// Record a broker rejection; the envelope becomes eligible to resend.
    pub fn record_rejection(&mut self) {
        self.sent = false;
        self.rejections += 1;
    }
}
