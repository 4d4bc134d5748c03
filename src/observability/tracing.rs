//! Per-request spans.
//!
//! Every request gets a UUID v4 that appears on all log lines emitted
//! while handling it. The ID lives only in the span; it is never added to
//! forwarded or returned headers.

use axum::http::Request;
use tower_http::trace::MakeSpan;
use tracing::Span;
use uuid::Uuid;

/// `MakeSpan` for the gateway's `TraceLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "request",
            request_id = %Uuid::new_v4(),
            method = %request.method(),
            path = %request.uri().path(),
        )
    }
}
