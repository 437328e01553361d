//! # Queue Dispatch Service
//!
//! Async entry point. Builds the envelope on the caller's task, then runs
//! the blocking handshake on tokio's blocking pool so the caller's event
//! loop keeps running. One connection per call, nothing shared between
//! calls except the immutable target and transport.

use std::sync::Arc;

use adaptor_telemetry::{
    metric_inc, DispatchOutcomeLabel, HistogramTimer, DISPATCHES_IN_FLIGHT, DISPATCH_DURATION,
    DISPATCH_TOTAL,
};
use async_trait::async_trait;
use serde::Serialize;
use tracing::Instrument;

use crate::application::driver::run_handshake;
use crate::application::envelope_builder::EnvelopeBuilder;
use crate::config::QueueAdaptorConfig;
use crate::domain::{
    ApplicationProperties, DeliveryStatus, DispatchError, Envelope, Target,
};
use crate::ports::{DeliveryReceipt, IdSource, QueueAdaptor, Transport, UuidSource};

/// Dispatch service - implements the [`QueueAdaptor`] capability over any
/// [`Transport`].
pub struct QueueDispatchService<T: Transport, I: IdSource = UuidSource> {
    target: Target,
    transport: Arc<T>,
    envelopes: EnvelopeBuilder<I>,
}

impl<T: Transport> QueueDispatchService<T> {
    /// Create a service with random correlation ids.
    pub fn new(config: &QueueAdaptorConfig, transport: Arc<T>) -> Self {
        Self::with_id_source(config, transport, UuidSource)
    }
}

impl<T: Transport, I: IdSource> QueueDispatchService<T, I> {
    /// Create a service drawing correlation ids from `ids`.
    pub fn with_id_source(config: &QueueAdaptorConfig, transport: Arc<T>, ids: I) -> Self {
        let target = config.target();
        tracing::info!(host = %target.display_host(), "Initialized queue adaptor");
        Self {
            target,
            transport,
            envelopes: EnvelopeBuilder::new(ids),
        }
    }

    /// Endpoint every call connects to.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Serialise any `Serialize` value as JSON and deliver it.
    pub async fn send_message<M: Serialize + ?Sized>(
        &self,
        message: &M,
        properties: Option<ApplicationProperties>,
    ) -> Result<DeliveryReceipt, DispatchError> {
        tracing::info!("Sending message asynchronously");
        let envelope = self.build(message, properties)?;
        self.dispatch(envelope).await
    }

    fn build<M: Serialize + ?Sized>(
        &self,
        message: &M,
        properties: Option<ApplicationProperties>,
    ) -> Result<Envelope, DispatchError> {
        self.envelopes.build(message, properties).inspect_err(|_| {
            metric_inc!(
                DISPATCH_TOTAL,
                &[DispatchOutcomeLabel::SerializationFailure.as_str()]
            );
        })
    }

    async fn dispatch(&self, envelope: Envelope) -> Result<DeliveryReceipt, DispatchError> {
        let transport = Arc::clone(&self.transport);
        let target = self.target.clone();
        let span = tracing::info_span!(
            "dispatch",
            host = %self.target.display_host(),
            correlation_id = %envelope.correlation_id()
        );

        let worker_span = span.clone();
        let joined = tokio::task::spawn_blocking(move || {
            worker_span.in_scope(|| dispatch_blocking(transport.as_ref(), &target, envelope))
        })
        .instrument(span)
        .await;

        joined.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Dispatch worker terminated abnormally");
            metric_inc!(DISPATCH_TOTAL, &[DispatchOutcomeLabel::WorkerFailure.as_str()]);
            Err(DispatchError::Worker(e.to_string()))
        })
    }
}

/// Keeps the in-flight gauge balanced even if the transport panics.
struct InFlight;

impl InFlight {
    fn enter() -> Self {
        DISPATCHES_IN_FLIGHT.inc();
        Self
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        DISPATCHES_IN_FLIGHT.dec();
    }
}

/// Run one handshake on the current thread, recording metrics.
fn dispatch_blocking<T: Transport + ?Sized>(
    transport: &T,
    target: &Target,
    envelope: Envelope,
) -> Result<DeliveryReceipt, DispatchError> {
    let outcome = {
        let _in_flight = InFlight::enter();
        let _timer = HistogramTimer::new(&DISPATCH_DURATION);
        run_handshake(transport, target, envelope)
    };

    let label = match &outcome {
        Ok(_) => DispatchOutcomeLabel::Accepted,
        Err(e) => match e.delivery_status() {
            DeliveryStatus::NotDelivered => DispatchOutcomeLabel::NotDelivered,
            DeliveryStatus::Rejected => DispatchOutcomeLabel::Rejected,
            DeliveryStatus::Unknown => DispatchOutcomeLabel::Unknown,
        },
    };
    metric_inc!(DISPATCH_TOTAL, &[label.as_str()]);

    outcome.map(|correlation_id| DeliveryReceipt { correlation_id })
}

#[async_trait]
impl<T: Transport, I: IdSource> QueueAdaptor for QueueDispatchService<T, I> {
    async fn send_async(
        &self,
        message: &serde_json::Value,
        properties: Option<ApplicationProperties>,
    ) -> Result<DeliveryReceipt, DispatchError> {
        self.send_message(message, properties).await
    }

    async fn send_raw_async(
        &self,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<DeliveryReceipt, DispatchError> {
        tracing::info!("Sending raw message asynchronously");
        let envelope = self.envelopes.build_raw(body, content_type);
        self.dispatch(envelope).await
    }

    fn send_sync(
        &self,
        message: &serde_json::Value,
        properties: Option<ApplicationProperties>,
    ) -> Result<DeliveryReceipt, DispatchError> {
        tracing::info!("Sending message synchronously");
        let envelope = self.build(message, properties)?;
        let span = tracing::info_span!(
            "dispatch",
            host = %self.target.display_host(),
            correlation_id = %envelope.correlation_id()
        );
        span.in_scope(|| dispatch_blocking(self.transport.as_ref(), &self.target, envelope))
    }
}
