//! # Spine Matching Flows
//!
//! Serves SOAP requests through the fake spine router, keyed on the
//! correlation ids the dispatch adaptor hands out.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use fake_spine::{
        message_id_matcher, router, RequestMatcher, SpineRequestResponseMapper, SpineResponse,
    };
    use queue_dispatch::{
        CorrelationId, QueueAdaptor, QueueAdaptorConfig, QueueDispatchService, ScriptedTransport,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn soap_request(message_id: &CorrelationId) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/"
                   xmlns:wsa="http://schemas.xmlsoap.org/ws/2004/08/addressing">
    <SOAP-ENV:Header>
        <wsa:MessageID>uuid:{}</wsa:MessageID>
    </SOAP-ENV:Header>
    <SOAP-ENV:Body/>
</SOAP-ENV:Envelope>"#,
            message_id
        )
    }

    async fn post(mapper: Arc<SpineRequestResponseMapper>, body: String) -> (StatusCode, String) {
        let response = router(mapper)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/reliablemessaging/reliablerequest")
                    .header("content-type", "text/xml")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn dispatched_correlation_id() -> CorrelationId {
        let service = QueueDispatchService::new(
            &QueueAdaptorConfig::new("amqp://broker/inbound", "user", "pass"),
            Arc::new(ScriptedTransport::accepting()),
        );
        service
            .send_async(&json!({"patient_id": "123"}), None)
            .await
            .unwrap()
            .correlation_id
    }

    // =============================================================================
    // INTEGRATION TESTS
    // =============================================================================

    #[tokio::test(flavor = "multi_thread")]
    async fn test_spine_answers_dispatched_message_id() {
        let id = dispatched_correlation_id().await;
        let mapper = Arc::new(SpineRequestResponseMapper::default().with(
            message_id_matcher("dispatched", id.to_string()),
            SpineResponse::new(StatusCode::ACCEPTED, "<Acknowledgment/>"),
        ));

        let (status, body) = post(mapper, soap_request(&id)).await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body, "<Acknowledgment/>");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_each_message_id_gets_its_own_response() {
        let first = dispatched_correlation_id().await;
        let second = dispatched_correlation_id().await;
        let mapper = Arc::new(
            SpineRequestResponseMapper::default()
                .with(
                    message_id_matcher("first", first.to_string()),
                    SpineResponse::ok("first"),
                )
                .with(
                    message_id_matcher("second", second.to_string()),
                    SpineResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "second"),
                ),
        );

        let (status, body) = post(Arc::clone(&mapper), soap_request(&second)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "second");

        let (status, body) = post(mapper, soap_request(&first)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "first");
    }

    #[tokio::test]
    async fn test_malformed_body_falls_through_to_next_matcher() {
        let mapper = Arc::new(
            SpineRequestResponseMapper::default()
                .with(
                    message_id_matcher("by-id", "123"),
                    SpineResponse::ok("by id"),
                )
                .with(
                    RequestMatcher::new("catch-all", |_| Ok(true)),
                    SpineResponse::new(StatusCode::BAD_REQUEST, "catch-all"),
                ),
        );

        let (status, body) = post(mapper, "<broken><xml></broken>".to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "catch-all");
    }

    #[tokio::test]
    async fn test_unknown_message_id_is_server_error() {
        let mapper = Arc::new(SpineRequestResponseMapper::default().with(
            message_id_matcher("known", "KNOWN"),
            SpineResponse::ok("known"),
        ));

        let (status, _) = post(mapper, soap_request(&CorrelationId::new())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
