//! # Queue Adaptor Configuration
//!
//! Broker endpoint and credentials. Every field may be unset; an unset
//! host or credential is carried through and fails at connect time.

use std::env;

use serde::{Deserialize, Serialize};

use crate::domain::{Credentials, Target};

/// Queue adaptor configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct QueueAdaptorConfig {
    /// Broker address including destination, e.g. `amqps://broker:5671/outbound`.
    pub host: Option<String>,

    /// Username used to connect.
    pub username: Option<String>,

    /// Password used to connect.
    pub password: Option<String>,
}

impl QueueAdaptorConfig {
    /// Configuration with all three values set.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: Some(host.into()),
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// - `QD_QUEUE_HOST`: Broker address
    /// - `QD_QUEUE_USERNAME`: Username
    /// - `QD_QUEUE_PASSWORD`: Password
    pub fn from_env() -> Self {
        Self {
            host: env::var("QD_QUEUE_HOST").ok(),
            username: env::var("QD_QUEUE_USERNAME").ok(),
            password: env::var("QD_QUEUE_PASSWORD").ok(),
        }
    }

    /// Endpoint descriptor handed to the transport.
    pub fn target(&self) -> Target {
        Target {
            host: self.host.clone(),
            credentials: Credentials {
                username: self.username.clone(),
                password: self.password.clone(),
            },
        }
    }
}

impl std::fmt::Debug for QueueAdaptorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueAdaptorConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
