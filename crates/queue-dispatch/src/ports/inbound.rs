//! # Inbound Ports
//!
//! The send capability any queue backend must provide.

use async_trait::async_trait;

use crate::domain::{ApplicationProperties, CorrelationId, DispatchError};

/// Proof that the broker accepted a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Correlation id carried by the accepted envelope.
    pub correlation_id: CorrelationId,
}

/// Queue adaptor - inbound port.
///
/// Each call is an independent, single-message handshake. Nothing is
/// retried; callers that want retries or timeouts layer them on top.
#[async_trait]
pub trait QueueAdaptor: Send + Sync {
    /// Serialise `message` as JSON and deliver it, suspending the calling
    /// task (not its executor thread) until the broker's verdict is known.
    async fn send_async(
        &self,
        message: &serde_json::Value,
        properties: Option<ApplicationProperties>,
    ) -> Result<DeliveryReceipt, DispatchError>;

    /// Deliver a pre-serialised body with an explicit content type.
    async fn send_raw_async(
        &self,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<DeliveryReceipt, DispatchError>;

    /// Deliver `message`, blocking the calling thread until the handshake
    /// completes. Must not be called from an async executor thread.
    fn send_sync(
        &self,
        message: &serde_json::Value,
        properties: Option<ApplicationProperties>,
    ) -> Result<DeliveryReceipt, DispatchError>;
}
