//! # Value Objects
//!
//! Identifiers, endpoint descriptors and the handshake state vocabulary.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::HandshakeFailure;

/// Content type of JSON-serialised message bodies.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Application properties attached to an envelope.
pub type ApplicationProperties = BTreeMap<String, serde_json::Value>;

/// Unique token attached to each envelope.
///
/// Rendered as an upper-case hyphenated UUID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_string().to_uppercase())
    }
}

/// Login credentials for the broker. Either half may be unset.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Username, if any.
    pub username: Option<String>,
    /// Password, if any.
    pub password: Option<String>,
}

impl Credentials {
    /// Credentials with both halves set.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// True when neither username nor password is set.
    pub fn is_anonymous(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Broker endpoint a handshake connects to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Broker address including the destination, e.g. `amqps://broker:5671/outbound`.
    pub host: Option<String>,
    /// Credentials presented at connect time.
    pub credentials: Credentials,
}

impl Target {
    /// Target with a host and credentials.
    pub fn new(host: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            host: Some(host.into()),
            credentials,
        }
    }

    /// Host for log lines and error messages.
    pub fn display_host(&self) -> &str {
        self.host.as_deref().unwrap_or("<unset>")
    }
}

/// Remote error condition attached to a transport-level failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCondition {
    /// Symbolic condition name, e.g. `amqp:unauthorized-access`.
    pub name: String,
    /// Free-text description supplied by the peer.
    pub description: Option<String>,
}

impl ErrorCondition {
    /// Condition without a description.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Display for ErrorCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{} ({})", self.name, description),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Handle to an established outbound link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SenderLink {
    /// Address the link delivers to.
    pub address: String,
}

impl SenderLink {
    /// Create a link handle.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

/// Lifecycle state of one handshake.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum HandshakeState {
    /// Nothing has happened yet.
    #[default]
    Idle,
    /// Opening the sender link.
    Connecting,
    /// Link is open; waiting for a sendable signal with credit.
    AwaitingCredit,
    /// Envelope transmitted; waiting for the broker's verdict.
    Sent,
    /// Broker accepted the envelope. Terminal success.
    Accepted,
    /// Terminal failure.
    Failed(HandshakeFailure),
}

impl HandshakeState {
    /// Check if transition to next state is valid.
    pub fn can_transition_to(&self, next: &HandshakeState) -> bool {
        match (self, next) {
            (Self::Idle, Self::Connecting) => true,
            (Self::Idle, Self::Failed(_)) => true,
            (Self::Connecting, Self::AwaitingCredit) => true,
            (Self::AwaitingCredit, Self::Sent) => true,
            (Self::Sent, Self::Accepted) => true,
            (Self::Sent, Self::AwaitingCredit) => true, // rejected, may resend
            (Self::Connecting | Self::AwaitingCredit | Self::Sent, Self::Failed(_)) => true,
            _ => false,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Failed(_))
    }

    /// Short name for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::AwaitingCredit => "awaiting_credit",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Failed(_) => "failed",
        }
    }
}
