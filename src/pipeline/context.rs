//! Per-request pipeline state and the context handed to each stage.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use futures_util::future::BoxFuture;
use serde_json::{Map, Value};

use crate::error::GatewayError;
use crate::pattern::Params;
use crate::routing::{DispatchSequence, PendingInvocation};

use super::{DispatchOutcome, ExecutionPipeline};

/// Everything one in-flight request owns: position in the dispatch
/// sequence, the request itself, and the shared data bag.
pub(crate) struct PipelineState<'p> {
    pipeline: &'p ExecutionPipeline,
    sequence: DispatchSequence,
    request: Request<Body>,
    data: Map<String, Value>,
    fail_open: bool,
}

impl<'p> PipelineState<'p> {
    pub(crate) fn new(
        pipeline: &'p ExecutionPipeline,
        sequence: DispatchSequence,
        request: Request<Body>,
    ) -> Self {
        Self {
            pipeline,
            sequence,
            request,
            data: Map::new(),
            fail_open: false,
        }
    }

    pub(crate) fn request(&self) -> &Request<Body> {
        &self.request
    }

    pub(crate) fn request_mut(&mut self) -> &mut Request<Body> {
        &mut self.request
    }

    pub(crate) fn failed_open(&self) -> bool {
        self.fail_open
    }

    /// Pull the next handler off the sequence and run it. Boxed because
    /// every `proceed` call recurses through here.
    pub(crate) fn advance(
        &mut self,
        replacement: Option<Request<Body>>,
    ) -> BoxFuture<'_, Result<Response<Body>, GatewayError>> {
        Box::pin(async move {
            if let Some(request) = replacement {
                self.request = request;
            }
            match self.sequence.next() {
                Some(PendingInvocation {
                    handler,
                    params,
                    sub_path,
                    route,
                }) => {
                    tracing::debug!(route = %route, sub_path = %sub_path, "invoking handler");
                    let mut ctx = StageContext {
                        state: self,
                        params,
                        sub_path,
                        route,
                    };
                    handler.invoke(&mut ctx).await
                }
                None => self.fallback().await,
            }
        })
    }

    /// No terminal route claimed the request: assets, then upstream,
    /// then a plain 404.
    async fn fallback(&mut self) -> Result<Response<Body>, GatewayError> {
        let pipeline = self.pipeline;

        if let Some(assets) = &pipeline.assets {
            let mut response = assets.serve(&self.request).await?;
            response.extensions_mut().insert(DispatchOutcome::Asset);
            return Ok(response);
        }

        if let Some(upstream) = &pipeline.upstream {
            let request = self.take_request();
            let mut response = upstream.forward(request).await?;
            response.extensions_mut().insert(DispatchOutcome::Passthrough);
            return Ok(response);
        }

        tracing::debug!(path = %self.request.uri().path(), "no route, asset, or upstream matched");
        let mut response = Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("Not Found"))
            .unwrap();
        response.extensions_mut().insert(DispatchOutcome::Unrouted);
        Ok(response)
    }

    /// Move the request out (the upstream client consumes it), leaving
    /// a body-less placeholder with the same head so later stages still
    /// see the method, URI, and headers.
    fn take_request(&mut self) -> Request<Body> {
        let mut placeholder = Request::new(Body::empty());
        *placeholder.method_mut() = self.request.method().clone();
        *placeholder.uri_mut() = self.request.uri().clone();
        *placeholder.version_mut() = self.request.version();
        *placeholder.headers_mut() = self.request.headers().clone();
        std::mem::replace(&mut self.request, placeholder)
    }
}

/// The view a handler gets of the request it is serving.
///
/// Route-scoped values (`params`, `sub_path`, `route`) are owned by the
/// context and differ per stage; the request and data bag live in the
/// pipeline state and are shared down the whole chain.
pub struct StageContext<'s, 'p> {
    state: &'s mut PipelineState<'p>,
    params: Params,
    sub_path: String,
    route: String,
}

impl StageContext<'_, '_> {
    /// Hand control to the next stage. Resolves when everything
    /// downstream has produced a response.
    pub fn proceed(&mut self) -> BoxFuture<'_, Result<Response<Body>, GatewayError>> {
        self.state.advance(None)
    }

    /// Like [`proceed`](Self::proceed), but substitute the request every
    /// later stage (and the fallback chain) sees. Routing is not
    /// re-evaluated; the dispatch order was fixed by the original path.
    pub fn proceed_with(
        &mut self,
        request: Request<Body>,
    ) -> BoxFuture<'_, Result<Response<Body>, GatewayError>> {
        self.state.advance(Some(request))
    }

    pub fn request(&self) -> &Request<Body> {
        &self.state.request
    }

    pub fn request_mut(&mut self) -> &mut Request<Body> {
        &mut self.state.request
    }

    /// Parameters captured by this stage's route pattern.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Request path below this stage's mount point, always absolute.
    pub fn sub_path(&self) -> &str {
        &self.sub_path
    }

    /// Name of the route entry that scheduled this stage.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Request-scoped scratch values shared across stages.
    pub fn data(&self) -> &Map<String, Value> {
        &self.state.data
    }

    pub fn data_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.state.data
    }

    /// Replace the whole data bag. Only JSON objects are accepted; a
    /// handler swapping in anything else has broken the contract.
    pub fn set_data(&mut self, value: Value) -> Result<(), GatewayError> {
        match value {
            Value::Object(map) => {
                self.state.data = map;
                Ok(())
            }
            other => Err(GatewayError::ContractViolation(format!(
                "data must be an object, got {}",
                json_type(&other)
            ))),
        }
    }

    /// Deployment-scoped environment values. Read-only.
    pub fn env(&self) -> &Value {
        &self.state.pipeline.env
    }

    /// Ask the error capture stage to prefer the asset fallback over a
    /// diagnostic body if this request ends in an error.
    pub fn mark_fail_open(&mut self) {
        self.state.fail_open = true;
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
