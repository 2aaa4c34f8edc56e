//! Outbound pass-through to a configured upstream.

use axum::body::Body;
use axum::http::uri::{Authority, InvalidUri, Scheme};
use axum::http::{Request, Uri};
use axum::response::Response;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::error::GatewayError;

/// HTTP client that replays unmatched requests against one upstream
/// authority, preserving method, path, headers, and body.
pub struct UpstreamClient {
    client: Client<HttpConnector, Body>,
    authority: Authority,
}

impl UpstreamClient {
    /// `address` is a host or host:port, e.g. `127.0.0.1:9000`.
    pub fn new(address: &str) -> Result<Self, InvalidUri> {
        let authority: Authority = address.parse()?;
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Ok(Self { client, authority })
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Rewrite the request URI onto the upstream authority and send it.
    pub async fn forward(&self, mut request: Request<Body>) -> Result<Response<Body>, GatewayError> {
        let mut parts = request.uri().clone().into_parts();
        parts.scheme = Some(Scheme::HTTP);
        parts.authority = Some(self.authority.clone());
        let uri = Uri::from_parts(parts).unwrap_or_else(|_| request.uri().clone());
        *request.uri_mut() = uri;

        tracing::debug!(uri = %request.uri(), "passing request through to upstream");

        let response = self
            .client
            .request(request)
            .await
            .map_err(|source| GatewayError::Upstream { source })?;

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}
