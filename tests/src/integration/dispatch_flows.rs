//! # Dispatch Flows
//!
//! Drives [`QueueDispatchService`] through the async capability against
//! scripted broker sessions and checks the outcome each caller observes.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use serde_json::json;

    use queue_dispatch::{
        ApplicationProperties, DeliveryStatus, DispatchError, ErrorCondition, HandshakeFailure,
        LinkEvent, QueueAdaptor, QueueAdaptorConfig, QueueDispatchService, ScriptedTransport,
        CONTENT_TYPE_JSON,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const HOST: &str = "amqps://broker.example:5671/outbound";

    fn config() -> QueueAdaptorConfig {
        QueueAdaptorConfig::new(HOST, "adaptor", "secret")
    }

    fn service_over(
        script: Vec<LinkEvent>,
    ) -> (Arc<ScriptedTransport>, QueueDispatchService<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(script));
        let service = QueueDispatchService::new(&config(), Arc::clone(&transport));
        (transport, service)
    }

    fn handshake_failure(err: &DispatchError) -> HandshakeFailure {
        err.failure()
            .cloned()
            .unwrap_or_else(|| panic!("expected a handshake failure, got {err:?}"))
    }

    // =============================================================================
    // ACCEPTANCE
    // =============================================================================

    #[tokio::test(flavor = "multi_thread")]
    async fn test_patient_message_is_accepted() {
        let (transport, service) = service_over(vec![
            LinkEvent::Start,
            LinkEvent::Sendable { credit: 1 },
            LinkEvent::Accepted,
        ]);

        let receipt = service
            .send_async(&json!({"patient_id": "123"}), None)
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].content_type(), CONTENT_TYPE_JSON);
        assert_eq!(sent[0].correlation_id(), receipt.correlation_id);
        assert_eq!(
            sent[0].decode_body::<serde_json::Value>().unwrap(),
            json!({"patient_id": "123"})
        );
        assert!(sent[0].properties().is_none());

        let rendered = receipt.correlation_id.to_string();
        assert_eq!(rendered, rendered.to_uppercase());
        assert_eq!(rendered.len(), 36);

        assert_eq!(transport.targets()[0].host.as_deref(), Some(HOST));
        assert_eq!(transport.closes(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_properties_travel_with_envelope() {
        let (transport, service) = service_over(vec![
            LinkEvent::Start,
            LinkEvent::Sendable { credit: 3 },
            LinkEvent::Accepted,
        ]);

        let mut properties = ApplicationProperties::new();
        properties.insert("message-type".to_string(), json!("update-request"));
        properties.insert("attempt".to_string(), json!(1));

        service
            .send_async(&json!({"nhs_number": "9999999999"}), Some(properties.clone()))
            .await
            .unwrap();

        assert_eq!(transport.sent()[0].properties(), Some(&properties));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_raw_body_is_sent_verbatim() {
        let (transport, service) = service_over(vec![
            LinkEvent::Start,
            LinkEvent::Sendable { credit: 1 },
            LinkEvent::Accepted,
        ]);

        let body = b"<PRPA_IN000001/>".to_vec();
        service
            .send_raw_async(body.clone(), "application/xml")
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].body(), body.as_slice());
        assert_eq!(sent[0].content_type(), "application/xml");
    }

    #[test]
    fn test_send_sync_outside_runtime() {
        let (transport, service) = service_over(vec![
            LinkEvent::Start,
            LinkEvent::Sendable { credit: 1 },
            LinkEvent::Accepted,
        ]);

        let receipt = service.send_sync(&json!({"patient_id": "456"}), None).unwrap();

        assert_eq!(transport.sent()[0].correlation_id(), receipt.correlation_id);
    }

    // =============================================================================
    // FAILURES
    // =============================================================================

    #[tokio::test(flavor = "multi_thread")]
    async fn test_zero_credit_fails_without_sending() {
        let (transport, service) = service_over(vec![
            LinkEvent::Start,
            LinkEvent::Sendable { credit: 0 },
        ]);

        let err = service
            .send_async(&json!({"patient_id": "123"}), None)
            .await
            .unwrap_err();

        assert_eq!(handshake_failure(&err), HandshakeFailure::CreditUnavailable);
        assert_eq!(err.delivery_status(), DeliveryStatus::NotDelivered);
        assert!(transport.sent().is_empty());
        assert_eq!(transport.closes(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_disconnect_before_send_is_early_disconnect() {
        let (transport, service) =
            service_over(vec![LinkEvent::Start, LinkEvent::Disconnected]);

        let err = service.send_async(&json!({}), None).await.unwrap_err();

        assert_eq!(handshake_failure(&err), HandshakeFailure::EarlyDisconnect);
        assert_eq!(err.delivery_status(), DeliveryStatus::NotDelivered);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rejection_then_disconnect_reports_rejection() {
        let (transport, service) = service_over(vec![
            LinkEvent::Start,
            LinkEvent::Sendable { credit: 1 },
            LinkEvent::Rejected,
            LinkEvent::Disconnected,
        ]);

        let err = service.send_async(&json!({"a": 1}), None).await.unwrap_err();

        assert_eq!(handshake_failure(&err), HandshakeFailure::Rejected);
        assert_eq!(err.delivery_status(), DeliveryStatus::Rejected);
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_disconnect_after_send_is_unconfirmed() {
        let (_, service) = service_over(vec![
            LinkEvent::Start,
            LinkEvent::Sendable { credit: 1 },
            LinkEvent::Disconnected,
        ]);

        let err = service.send_async(&json!({"a": 1}), None).await.unwrap_err();

        assert_eq!(handshake_failure(&err), HandshakeFailure::UnconfirmedDelivery);
        assert_eq!(err.delivery_status(), DeliveryStatus::Unknown);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_connection_error_after_send_is_unknown() {
        let (transport, service) = service_over(vec![
            LinkEvent::Start,
            LinkEvent::Sendable { credit: 1 },
            LinkEvent::ConnectionError(ErrorCondition::new("amqp:connection:forced")),
        ]);

        let err = service.send_async(&json!({"a": 1}), None).await.unwrap_err();

        assert!(matches!(
            handshake_failure(&err),
            HandshakeFailure::ConnectionError(_)
        ));
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(err.delivery_status(), DeliveryStatus::Unknown);
        assert_eq!(transport.closes(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_zero_credit_after_send_is_unknown() {
        let (transport, service) = service_over(vec![
            LinkEvent::Start,
            LinkEvent::Sendable { credit: 1 },
            LinkEvent::Sendable { credit: 0 },
        ]);

        let err = service.send_async(&json!({"a": 1}), None).await.unwrap_err();

        assert_eq!(handshake_failure(&err), HandshakeFailure::CreditUnavailable);
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(err.delivery_status(), DeliveryStatus::Unknown);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_zero_credit_after_rejection_reports_rejection() {
        let (transport, service) = service_over(vec![
            LinkEvent::Start,
            LinkEvent::Sendable { credit: 1 },
            LinkEvent::Rejected,
            LinkEvent::Sendable { credit: 0 },
        ]);

        let err = service.send_async(&json!({"a": 1}), None).await.unwrap_err();

        assert_eq!(handshake_failure(&err), HandshakeFailure::CreditUnavailable);
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(err.delivery_status(), DeliveryStatus::Rejected);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_link_error_is_surfaced_with_condition() {
        let condition = ErrorCondition::new("amqp:unauthorized-access")
            .with_description("bad credentials");
        let (_, service) = service_over(vec![
            LinkEvent::Start,
            LinkEvent::LinkError(condition.clone()),
        ]);

        let err = service.send_async(&json!({}), None).await.unwrap_err();

        assert_eq!(handshake_failure(&err), HandshakeFailure::LinkError(condition));
        assert_eq!(err.delivery_status(), DeliveryStatus::NotDelivered);
        let message = err.to_string();
        assert!(message.contains(HOST));
        assert!(message.contains("amqp:unauthorized-access"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unreachable_broker_is_connection_error() {
        let transport = Arc::new(ScriptedTransport::refusing(ErrorCondition::new(
            "amqp:connection:refused",
        )));
        let service = QueueDispatchService::new(&config(), Arc::clone(&transport));

        let err = service.send_async(&json!({}), None).await.unwrap_err();

        assert!(matches!(
            handshake_failure(&err),
            HandshakeFailure::ConnectionError(_)
        ));
        assert_eq!(transport.connections(), 0);
    }

    // =============================================================================
    // CONCURRENCY
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sends_get_distinct_correlation_ids() {
        let transport = Arc::new(ScriptedTransport::accepting());
        let service = Arc::new(QueueDispatchService::new(&config(), Arc::clone(&transport)));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service
                        .send_async(&json!({"patient_id": i.to_string()}), None)
                        .await
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            let receipt = handle.await.unwrap().unwrap();
            assert!(ids.insert(receipt.correlation_id));
        }

        assert_eq!(ids.len(), 16);
        assert_eq!(transport.connections(), 16);
        assert_eq!(transport.closes(), 16);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failed_send_does_not_affect_next_send() {
        let transport = Arc::new(ScriptedTransport::accepting());
        transport.push_script(vec![LinkEvent::Start, LinkEvent::Sendable { credit: 0 }]);
        let service = QueueDispatchService::new(&config(), Arc::clone(&transport));

        assert!(service.send_async(&json!({"n": 1}), None).await.is_err());
        assert!(service.send_async(&json!({"n": 2}), None).await.is_ok());

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].decode_body::<serde_json::Value>().unwrap(),
            json!({"n": 2})
        );
    }

    // =============================================================================
    // TELEMETRY
    // =============================================================================

    #[tokio::test(flavor = "multi_thread")]
    async fn test_outcomes_are_counted() {
        adaptor_telemetry::register_metrics().unwrap();
        let (_, service) = service_over(vec![
            LinkEvent::Start,
            LinkEvent::Sendable { credit: 1 },
            LinkEvent::Accepted,
        ]);

        service.send_async(&json!({}), None).await.unwrap();

        let text = adaptor_telemetry::encode_metrics().unwrap();
        assert!(text.contains(r#"qd_dispatch_total{outcome="accepted"}"#));
        assert!(text.contains("qd_dispatch_duration_seconds"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failure_after_send_is_counted_as_unknown() {
        adaptor_telemetry::register_metrics().unwrap();
        let (_, service) = service_over(vec![
            LinkEvent::Start,
            LinkEvent::Sendable { credit: 1 },
            LinkEvent::LinkError(ErrorCondition::new("amqp:link:detach-forced")),
        ]);

        assert!(service.send_async(&json!({}), None).await.is_err());

        let text = adaptor_telemetry::encode_metrics().unwrap();
        assert!(text.contains(r#"qd_dispatch_total{outcome="unknown"}"#));
    }
}
