//! Upstream forwarding with credential substitution.
//!
//! # Responsibilities
//! - Hold the fixed upstream target (scheme + authority)
//! - Rewrite an inbound request into its outbound copy
//! - Dispatch it through a shared, pooled HTTP client
//!
//! # Design Decisions
//! - Path and query are forwarded byte-for-byte
//! - The inbound `Host` header is dropped; the client derives it from the target
//! - `X-Api-Key` is always overwritten with the outbound key
//! - Redirects are relayed to the caller, never followed
//! - The request body is streamed, never buffered

use std::time::Duration;

use axum::{
    body::{Body, HttpBody},
    http::{
        header::{HeaderName, HeaderValue, InvalidHeaderValue, HOST},
        uri::{Authority, PathAndQuery, Scheme},
        Request, Uri,
    },
};

use crate::config::{TimeoutConfig, UpstreamConfig};

/// Header carrying the API key, inbound and outbound.
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Error building the upstream client.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream.scheme `{0}` must be `http` or `https`")]
    Scheme(String),
    #[error("upstream.host `{0}` is not a valid host")]
    Host(String),
    #[error("outbound API key is not a valid header value")]
    ApiKey(#[from] InvalidHeaderValue),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Error forwarding one request. Every variant is reported to callers as 500.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("invalid outbound URI: {0}")]
    Uri(#[from] axum::http::Error),
    #[error("invalid outbound URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Fixed destination of all forwarded requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    scheme: Scheme,
    authority: Authority,
}

impl UpstreamTarget {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let scheme = match config.scheme.as_str() {
            "https" => Scheme::HTTPS,
            "http" => Scheme::HTTP,
            other => return Err(UpstreamError::Scheme(other.to_string())),
        };
        let authority = config
            .host
            .parse::<Authority>()
            .map_err(|_| UpstreamError::Host(config.host.clone()))?;

        Ok(Self { scheme, authority })
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Point an inbound request target at the upstream, keeping path and query.
    pub fn rewrite(&self, uri: &Uri) -> Result<Uri, axum::http::Error> {
        let path_and_query = uri
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }
}

/// Shared upstream client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Upstream {
    client: reqwest::Client,
    target: UpstreamTarget,
    api_key: HeaderValue,
}

impl Upstream {
    pub fn new(
        config: &UpstreamConfig,
        timeouts: &TimeoutConfig,
        outbound_key: &str,
    ) -> Result<Self, UpstreamError> {
        let target = UpstreamTarget::from_config(config)?;

        let mut api_key = HeaderValue::from_str(outbound_key)?;
        api_key.set_sensitive(true);

        let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());
        if timeouts.upstream_secs > 0 {
            builder = builder.timeout(Duration::from_secs(timeouts.upstream_secs));
        }
        if timeouts.connect_secs > 0 {
            builder = builder.connect_timeout(Duration::from_secs(timeouts.connect_secs));
        }
        if !config.system_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
            target,
            api_key,
        })
    }

    pub fn target(&self) -> &UpstreamTarget {
        &self.target
    }

    /// Build the outbound copy of an inbound request.
    pub fn outbound_request(&self, request: Request<Body>) -> Result<reqwest::Request, ForwardError> {
        let (parts, body) = request.into_parts();

        let uri = self.target.rewrite(&parts.uri)?;
        let url = reqwest::Url::parse(&uri.to_string())?;

        let mut headers = parts.headers;
        headers.remove(HOST);
        headers.insert(API_KEY_HEADER, self.api_key.clone());

        let mut builder = self.client.request(parts.method, url).headers(headers);
        // An empty body must stay absent, or GETs would go out chunked.
        if !body.is_end_stream() {
            builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        Ok(builder.build()?)
    }

    /// Forward a request and return the upstream response.
    ///
    /// Non-2xx upstream statuses are successful exchanges. Dropping the
    /// returned future cancels the upstream call.
    pub async fn forward(&self, request: Request<Body>) -> Result<reqwest::Response, ForwardError> {
        let outbound = self.outbound_request(request)?;
        Ok(self.client.execute(outbound).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn upstream(scheme: &str, host: &str) -> Upstream {
        let config = UpstreamConfig {
            scheme: scheme.into(),
            host: host.into(),
            system_proxy: false,
        };
        Upstream::new(&config, &TimeoutConfig::default(), "real-key").unwrap()
    }

    #[test]
    fn test_rewrite_keeps_path_and_query() {
        let target = upstream("https", "api.mackerelio.com").target().clone();
        let uri: Uri = "/api/v0/hosts?customIdentifier=a%20b&status=working".parse().unwrap();

        assert_eq!(
            target.rewrite(&uri).unwrap().to_string(),
            "https://api.mackerelio.com/api/v0/hosts?customIdentifier=a%20b&status=working"
        );
    }

    #[test]
    fn test_rewrite_replaces_absolute_form_authority() {
        let target = upstream("http", "127.0.0.1:3000").target().clone();
        let uri: Uri = "http://gateway.local:8080/api/v0/tsdb".parse().unwrap();

        assert_eq!(target.rewrite(&uri).unwrap().to_string(), "http://127.0.0.1:3000/api/v0/tsdb");
    }

    #[test]
    fn test_outbound_request_swaps_key_and_host() {
        let upstream = upstream("https", "api.mackerelio.com");
        let inbound = Request::builder()
            .method(Method::PUT)
            .uri("/api/v0/hosts/abc123")
            .header("host", "localhost:8080")
            .header("x-api-key", "DUMMY_APIKEY")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let outbound = upstream.outbound_request(inbound).unwrap();

        assert_eq!(outbound.method(), Method::PUT);
        assert_eq!(outbound.url().as_str(), "https://api.mackerelio.com/api/v0/hosts/abc123");
        assert_eq!(outbound.headers()["x-api-key"], "real-key");
        assert_eq!(outbound.headers().get_all("x-api-key").iter().count(), 1);
        assert_eq!(outbound.headers()["content-type"], "application/json");
        assert!(outbound.headers().get("host").is_none());
        assert!(outbound.body().is_some());
    }

    #[test]
    fn test_empty_body_is_not_streamed() {
        let upstream = upstream("https", "api.mackerelio.com");
        let inbound = Request::builder()
            .uri("/api/v0/hosts/abc123")
            .body(Body::empty())
            .unwrap();

        let outbound = upstream.outbound_request(inbound).unwrap();

        assert_eq!(outbound.method(), Method::GET);
        assert!(outbound.body().is_none());
    }

    #[test]
    fn test_invalid_target_rejected() {
        let timeouts = TimeoutConfig::default();
        let bad_scheme = UpstreamConfig {
            scheme: "ftp".into(),
            ..UpstreamConfig::default()
        };
        assert!(matches!(
            Upstream::new(&bad_scheme, &timeouts, "k"),
            Err(UpstreamError::Scheme(_))
        ));

        assert!(matches!(
            Upstream::new(&UpstreamConfig::default(), &timeouts, "bad\nkey"),
            Err(UpstreamError::ApiKey(_))
        ));
    }
}
