//! # Request Matching
//!
//! Ordered predicate → canned response table.

use adaptor_telemetry::{metric_inc, SPINE_REQUESTS};
use axum::http::{HeaderMap, Method, StatusCode, Uri};

use crate::errors::{MatcherError, SpineError};

/// An inbound request as seen by matchers.
#[derive(Clone, Debug)]
pub struct SpineRequest {
    /// HTTP method.
    pub method: Method,
    /// Request URI.
    pub uri: Uri,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body as text.
    pub body: String,
}

impl SpineRequest {
    /// A `POST /` request with the given body and no headers.
    pub fn post(body: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            uri: Uri::from_static("/"),
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// Canned response returned for a matched request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpineResponse {
    /// Status code to return.
    pub status: StatusCode,
    /// Body to return.
    pub body: String,
}

impl SpineResponse {
    /// Response with an explicit status.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// `200 OK` with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Status and body to send.
    pub fn get_response(&self) -> (StatusCode, String) {
        (self.status, self.body.clone())
    }
}

type MatchFn = dyn Fn(&SpineRequest) -> Result<bool, MatcherError> + Send + Sync;

/// Named request predicate.
pub struct RequestMatcher {
    unique_identifier: String,
    matcher: Box<MatchFn>,
}

impl RequestMatcher {
    /// Wrap a predicate under a name used in log lines.
    pub fn new<F>(unique_identifier: impl Into<String>, matcher: F) -> Self
    where
        F: Fn(&SpineRequest) -> Result<bool, MatcherError> + Send + Sync + 'static,
    {
        Self {
            unique_identifier: unique_identifier.into(),
            matcher: Box::new(matcher),
        }
    }

    /// Name of this matcher.
    pub fn unique_identifier(&self) -> &str {
        &self.unique_identifier
    }

    /// Evaluate the predicate.
    pub fn does_match(&self, request: &SpineRequest) -> Result<bool, MatcherError> {
        (self.matcher)(request)
    }
}

impl std::fmt::Debug for RequestMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestMatcher")
            .field("unique_identifier", &self.unique_identifier)
            .finish_non_exhaustive()
    }
}

/// Maps requests to responses. Matchers are tried in registration order.
#[derive(Debug, Default)]
pub struct SpineRequestResponseMapper {
    entries: Vec<(RequestMatcher, SpineResponse)>,
}

impl SpineRequestResponseMapper {
    /// Mapper over pre-built entries.
    pub fn new(entries: Vec<(RequestMatcher, SpineResponse)>) -> Self {
        Self { entries }
    }

    /// Append an entry.
    pub fn with(mut self, matcher: RequestMatcher, response: SpineResponse) -> Self {
        self.entries.push((matcher, response));
        self
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Response of the first matcher that accepts `request`.
    ///
    /// A matcher that errors is logged and skipped.
    pub fn response_for_request(
        &self,
        request: &SpineRequest,
    ) -> Result<(StatusCode, String), SpineError> {
        for (matcher, response) in &self.entries {
            match matcher.does_match(request) {
                Ok(true) => {
                    tracing::info!(
                        matcher = matcher.unique_identifier(),
                        "Request matched a configured matcher"
                    );
                    metric_inc!(SPINE_REQUESTS, &["matched"]);
                    return Ok(response.get_response());
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        matcher = matcher.unique_identifier(),
                        error = %e,
                        "Matcher failed whilst trying to match"
                    );
                    metric_inc!(SPINE_REQUESTS, &["matcher_error"]);
                }
            }
        }

        tracing::error!(
            method = %request.method,
            uri = %request.uri,
            headers = ?request.headers,
            "No matcher configured that matched request"
        );
        metric_inc!(SPINE_REQUESTS, &["unmatched"]);
        Err(SpineError::NoMatchingResponse)
    }
}
