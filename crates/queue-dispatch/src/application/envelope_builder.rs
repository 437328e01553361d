//! # Envelope Builder
//!
//! Wraps an outbound message in an [`Envelope`] with a fresh correlation id.

use serde::Serialize;

use crate::domain::{ApplicationProperties, DispatchError, Envelope, CONTENT_TYPE_JSON};
use crate::ports::{IdSource, UuidSource};

/// Builds envelopes, drawing one id per envelope from the id source.
#[derive(Debug, Default)]
pub struct EnvelopeBuilder<I: IdSource = UuidSource> {
    ids: I,
}

impl<I: IdSource> EnvelopeBuilder<I> {
    /// Builder over the given id source.
    pub fn new(ids: I) -> Self {
        Self { ids }
    }

    /// Serialise `message` as JSON and wrap it.
    pub fn build<M: Serialize + ?Sized>(
        &self,
        message: &M,
        properties: Option<ApplicationProperties>,
    ) -> Result<Envelope, DispatchError> {
        let body = serde_json::to_vec(message)?;
        let correlation_id = self.ids.next_id();
        tracing::info!(
            %correlation_id,
            application_properties = ?properties,
            "Constructing message"
        );
        Ok(Envelope::new(correlation_id, CONTENT_TYPE_JSON, body, properties))
    }

    /// Wrap an already-serialised body. No application properties are attached.
    pub fn build_raw(&self, body: Vec<u8>, content_type: &str) -> Envelope {
        let correlation_id = self.ids.next_id();
        tracing::info!(%correlation_id, content_type, "Constructing raw message");
        Envelope::new(correlation_id, content_type, body, None)
    }
}
