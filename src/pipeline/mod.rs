//! Per-request execution pipeline.
//!
//! # Data Flow
//! ```text
//! Request
//!     → DispatchSequence (lazy handler stream)
//!     → advance: invoke next handler with a StageContext
//!         → handler returns a response, or
//!         → handler calls proceed() → advance recurses
//!     → sequence exhausted → fallback: assets → upstream → 404
//!     → error capture: reduce to a diagnostic 500 (or fail-open asset)
//!     → drain whatever is left of the request body
//!     → scrub bodies on statuses that must not carry one
//! ```
//!
//! # Responsibilities
//! - Drive the dispatch sequence, one handler at a time
//! - Hold the per-request state handlers share (request, data bag)
//! - Fall back when no terminal route claims the request
//! - Turn every failure into exactly one well-formed response
//!
//! # Design Decisions
//! - Continuation style: a middleware that never calls `proceed` stops
//!   the walk, and everything after its `proceed` call runs on the way
//!   back out of the stack
//! - The pipeline never panics a connection: handler errors become a
//!   structured 500, asset and upstream failures included
//! - The request body is drained before the response is returned so the
//!   peer can reuse the connection

pub mod context;
pub mod recover;

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use serde_json::Value;

use crate::error::GatewayError;
use crate::fallback::{StaticAssets, UpstreamClient};
use crate::routing::{DispatchSequence, RouteTable};

pub use context::StageContext;

use context::PipelineState;

/// Which arm of the pipeline produced the response. Attached to every
/// response as an extension for logging and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A routed handler built the response.
    Route,
    /// The static asset fallback served it.
    Asset,
    /// The upstream pass-through answered.
    Passthrough,
    /// Nothing matched; the built-in 404.
    Unrouted,
    /// The error capture stage produced a diagnostic response.
    Error,
}

impl DispatchOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchOutcome::Route => "route",
            DispatchOutcome::Asset => "asset",
            DispatchOutcome::Passthrough => "passthrough",
            DispatchOutcome::Unrouted => "unrouted",
            DispatchOutcome::Error => "error",
        }
    }
}

/// One assembled pipeline: route table plus optional fallback
/// collaborators. Build it once, share it behind an `Arc`, call
/// [`handle`](ExecutionPipeline::handle) per request.
pub struct ExecutionPipeline {
    pub(crate) table: Arc<RouteTable>,
    pub(crate) assets: Option<Arc<StaticAssets>>,
    pub(crate) upstream: Option<Arc<UpstreamClient>>,
    pub(crate) env: Arc<Value>,
}

impl ExecutionPipeline {
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self {
            table,
            assets: None,
            upstream: None,
            env: Arc::new(Value::Object(serde_json::Map::new())),
        }
    }

    pub fn with_assets(mut self, assets: StaticAssets) -> Self {
        self.assets = Some(Arc::new(assets));
        self
    }

    pub fn with_upstream(mut self, upstream: UpstreamClient) -> Self {
        self.upstream = Some(Arc::new(upstream));
        self
    }

    /// Deployment-scoped values exposed read-only to every handler.
    pub fn with_env(mut self, env: Value) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Run one request through the pipeline. Infallible by contract:
    /// every internal failure is reduced to a diagnostic response.
    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        let sequence = DispatchSequence::new(
            Arc::clone(&self.table),
            request.method().clone(),
            request.uri().path(),
        );
        let mut state = PipelineState::new(self, sequence, request);

        let result = state.advance(None).await;
        drain(state.request_mut()).await;

        let response = match result {
            Ok(response) => response,
            Err(error) => self.capture(&mut state, &error).await,
        };
        finish(response)
    }

    /// Error capture. Fail-open requests get one shot at the asset
    /// fallback before the diagnostic body goes out.
    ///
    /// The state is borrowed exclusively: a shared `&PipelineState` is
    /// not `Send` (the held request body is not `Sync`), and this future
    /// must be.
    async fn capture(&self, state: &mut PipelineState<'_>, error: &GatewayError) -> Response<Body> {
        if state.failed_open() {
            if let Some(assets) = &self.assets {
                match assets.serve(state.request()).await {
                    Ok(mut response) => {
                        tracing::debug!(error = %error, "fail-open request answered from assets");
                        response.extensions_mut().insert(DispatchOutcome::Asset);
                        return response;
                    }
                    Err(asset_error) => {
                        tracing::warn!(error = %asset_error, "fail-open asset fallback failed");
                    }
                }
            }
        }

        tracing::error!(error = %error, kind = error.kind(), "request pipeline failed");
        recover::error_response(error)
    }
}

/// Read the remaining request body frames off the wire and discard
/// them. Drain failures are logged, never surfaced; the response is
/// already decided by the time this runs.
async fn drain(request: &mut Request<Body>) {
    use http_body_util::BodyExt;
    use hyper::body::Body as _;

    let mut body = std::mem::replace(request.body_mut(), Body::empty());
    if body.is_end_stream() {
        return;
    }
    while let Some(frame) = body.frame().await {
        if let Err(error) = frame {
            tracing::warn!(error = %error, "failed to drain request body");
            break;
        }
    }
}

/// Final response conditioning: default outcome label, and no body on
/// statuses the protocol forbids one for.
fn finish(mut response: Response<Body>) -> Response<Body> {
    if response.extensions().get::<DispatchOutcome>().is_none() {
        response.extensions_mut().insert(DispatchOutcome::Route);
    }
    match response.status().as_u16() {
        // 101, 204, 205, 304 must not carry a payload.
        101 | 204 | 205 | 304 => {
            let (parts, _discarded) = response.into_parts();
            Response::from_parts(parts, Body::empty())
        }
        _ => response,
    }
}
