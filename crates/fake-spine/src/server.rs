//! # Fake Spine Server
//!
//! `axum` router that sends every request through the mapper.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;

use crate::config::FakeSpineConfig;
use crate::errors::SpineError;
use crate::matching::{SpineRequest, SpineRequestResponseMapper};

/// Router answering every method and path from `mapper`.
pub fn router(mapper: Arc<SpineRequestResponseMapper>) -> Router {
    Router::new().fallback(handle_request).with_state(mapper)
}

async fn handle_request(
    State(mapper): State<Arc<SpineRequestResponseMapper>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let request = SpineRequest {
        method,
        uri,
        headers,
        body,
    };

    match mapper.response_for_request(&request) {
        Ok((status, body)) => (status, body).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Bind the configured address and serve until the server stops.
pub async fn serve(
    config: &FakeSpineConfig,
    mapper: Arc<SpineRequestResponseMapper>,
) -> Result<(), SpineError> {
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!(addr = %config.bind_address, entries = mapper.len(), "Starting fake spine");
    axum::serve(listener, router(mapper)).await?;
    Ok(())
}
