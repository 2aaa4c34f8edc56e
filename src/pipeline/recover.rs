//! Error capture: reduce a failure into one structured diagnostic
//! response.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use serde::Serialize;

use crate::error::GatewayError;

use super::DispatchOutcome;

/// Bound on how far down a cause chain the reducer walks. Chains this
/// deep are almost certainly cyclic.
const MAX_CAUSE_DEPTH: usize = 32;

/// Serializable rendering of an error and its cause chain. This struct
/// is the entire 500 response body.
#[derive(Debug, Serialize)]
pub struct ErrorShape {
    pub name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<ErrorShape>>,
}

/// Walk the cause chain into a nested [`ErrorShape`]. Handler failures
/// are unwrapped so the handler's own error sits at the top level; the
/// other variants keep their taxonomy name. A backtrace is attached to
/// the outermost shape only, and only when capture is enabled.
pub fn reduce(error: &GatewayError) -> ErrorShape {
    let mut shape = match error {
        GatewayError::Handler { source } => chain(&**source, MAX_CAUSE_DEPTH),
        other => ErrorShape {
            name: other.kind().to_string(),
            message: other.to_string(),
            stack: None,
            cause: other
                .source()
                .map(|source| Box::new(chain(source, MAX_CAUSE_DEPTH))),
        },
    };

    let backtrace = Backtrace::capture();
    if backtrace.status() == BacktraceStatus::Captured {
        shape.stack = Some(backtrace.to_string());
    }
    shape
}

fn chain(error: &(dyn Error + 'static), depth: usize) -> ErrorShape {
    let cause = if depth == 0 {
        None
    } else {
        error
            .source()
            .map(|source| Box::new(chain(source, depth - 1)))
    };
    ErrorShape {
        name: "Error".to_string(),
        message: error.to_string(),
        stack: None,
        cause,
    }
}

/// The diagnostic 500 itself: the reduced shape serialized as the whole
/// body, tagged with the error outcome.
pub fn error_response(error: &GatewayError) -> Response<Body> {
    let shape = reduce(error);
    let body = serde_json::to_vec(&shape)
        .unwrap_or_else(|_| br#"{"name":"Error","message":"error serialization failed"}"#.to_vec());

    let mut response = Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    response.extensions_mut().insert(DispatchOutcome::Error);
    response
}
