//! Built-in handlers shipped with the default registry.

use std::time::Instant;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;

use crate::error::GatewayError;
use crate::pipeline::StageContext;

use super::Handler;

/// Middleware that logs one line per request after the downstream
/// stages have produced a response.
pub struct AccessLog;

#[async_trait]
impl Handler for AccessLog {
    async fn invoke(&self, ctx: &mut StageContext<'_, '_>) -> Result<Response<Body>, GatewayError> {
        let method = ctx.request().method().clone();
        let path = ctx.request().uri().path().to_string();
        let start = Instant::now();

        let response = ctx.proceed().await?;

        tracing::info!(
            method = %method,
            path = %path,
            status = response.status().as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "request completed"
        );
        Ok(response)
    }
}

/// Terminal handler answering liveness probes.
pub struct Health;

#[async_trait]
impl Handler for Health {
    async fn invoke(&self, _ctx: &mut StageContext<'_, '_>) -> Result<Response<Body>, GatewayError> {
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"status":"healthy"}"#))
            .unwrap();
        Ok(response)
    }
}
