//! HTTP server setup and the gateway handler.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (tracing with request IDs)
//! - Check the inbound API key, then the allowlist
//! - Forward authorized requests upstream and relay the response
//! - Serve until the shutdown signal, then drain in-flight requests

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::authz::{query_param_names, Authorizer, Decision, RuleError};
use crate::config::{GatewayConfig, ProxyCredentials};
use crate::http::forward::{Upstream, UpstreamError, API_KEY_HEADER};
use crate::http::response::{relay, Rejection};
use crate::observability::metrics;
use crate::observability::tracing::RequestSpan;

/// Error constructing the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Application state injected into handlers. Read-only after startup.
#[derive(Clone)]
pub struct GatewayState {
    pub authorizer: Arc<Authorizer>,
    pub inbound_key: Arc<str>,
    pub upstream: Upstream,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a new server with the given configuration and key pair.
    pub fn new(config: GatewayConfig, credentials: ProxyCredentials) -> Result<Self, ServerError> {
        let authorizer = Arc::new(Authorizer::from_config(&config.rules)?);
        let upstream = Upstream::new(&config.upstream, &config.timeouts, credentials.outbound())?;

        tracing::info!(
            rules = authorizer.rules().len(),
            upstream = %format!("{}://{}", upstream.target().scheme(), upstream.target().authority()),
            "Gateway initialized"
        );

        let state = GatewayState {
            authorizer,
            inbound_key: Arc::from(credentials.inbound()),
            upstream,
        };

        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    fn build_router(state: GatewayState) -> Router {
        Router::new()
            .route("/", any(gateway_handler))
            .route("/{*path}", any(gateway_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
    }

    /// The fully layered router, for driving without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections until `shutdown` fires.
    ///
    /// In-flight requests are allowed to finish before this returns.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

async fn gateway_handler(State(state): State<GatewayState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();

    match handle(&state, request).await {
        Ok(response) => {
            metrics::record_request(&method, "forwarded", response.status().as_u16(), start_time);
            response
        }
        Err(rejection) => {
            metrics::record_request(
                &method,
                rejection.outcome(),
                rejection.status().as_u16(),
                start_time,
            );
            rejection.into_response()
        }
    }
}

async fn handle(state: &GatewayState, request: Request<Body>) -> Result<Response, Rejection> {
    let presented = request.headers().get(API_KEY_HEADER).map(HeaderValue::as_bytes);
    if presented != Some(state.inbound_key.as_bytes()) {
        tracing::warn!(present = presented.is_some(), "Rejected: bad API key");
        return Err(Rejection::Unauthorized);
    }

    {
        let params = query_param_names(request.uri());
        let decision = state
            .authorizer
            .evaluate(request.method(), request.uri().path(), &params);

        match decision {
            Decision::Allowed { rule } => tracing::debug!(rule, "Authorized"),
            other => {
                tracing::warn!(decision = %other, "Rejected: not in allowlist");
                return Err(Rejection::Forbidden);
            }
        }
    }

    match state.upstream.forward(request).await {
        Ok(upstream) => {
            tracing::debug!(status = %upstream.status(), "Upstream responded");
            Ok(relay(upstream))
        }
        Err(e) => {
            tracing::error!(error = %e, "Upstream request failed");
            Err(Rejection::UpstreamFailed)
        }
    }
}
