//! Response handling.
//!
//! # Responsibilities
//! - Map gateway rejections to status codes
//! - Relay the upstream response (status, headers, body) to the caller
//!
//! # Design Decisions
//! - Rejections carry no body, so nothing internal leaks to callers
//! - Upstream bodies are streamed, never buffered
//! - A body read failure ends the stream after logging; bytes already
//!   relayed stay delivered

use std::convert::Infallible;

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{future, StreamExt};

/// Terminal outcomes decided by the gateway itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Missing or mismatched `X-Api-Key`.
    Unauthorized,
    /// No allowlist rule permits the request.
    Forbidden,
    /// The upstream exchange failed at the transport level.
    UpstreamFailed,
}

impl Rejection {
    pub fn status(self) -> StatusCode {
        match self {
            Rejection::Unauthorized => StatusCode::UNAUTHORIZED,
            Rejection::Forbidden => StatusCode::FORBIDDEN,
            Rejection::UpstreamFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metrics label.
    pub fn outcome(self) -> &'static str {
        match self {
            Rejection::Unauthorized => "unauthorized",
            Rejection::Forbidden => "forbidden",
            Rejection::UpstreamFailed => "upstream_error",
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        self.status().into_response()
    }
}

/// Copy status, headers and body of an upstream response verbatim.
pub fn relay(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let headers = upstream.headers().clone();

    let body = upstream.bytes_stream().scan((), |_, chunk| {
        future::ready(match chunk {
            Ok(bytes) => Some(Ok::<_, Infallible>(bytes)),
            Err(e) => {
                tracing::warn!(error = %e, "Failed reading upstream body");
                None
            }
        })
    });

    let mut response = Response::new(Body::from_stream(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_statuses() {
        assert_eq!(Rejection::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Rejection::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(Rejection::UpstreamFailed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_rejection_body_is_empty() {
        let response = Rejection::UpstreamFailed.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_relay_copies_status_headers_and_body() {
        let upstream = axum::http::Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("x-trace", "abc")
            .header("set-cookie", "a=1")
            .header("set-cookie", "b=2")
            .body("missing host")
            .unwrap();

        let response = relay(reqwest::Response::from(upstream));

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-trace"], "abc");
        assert_eq!(response.headers().get_all("set-cookie").iter().count(), 2);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"missing host");
    }
}
