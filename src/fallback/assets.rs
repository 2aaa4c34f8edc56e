//! Static asset serving.

use std::future::Future;
use std::io;
use std::path::{Component, Path, PathBuf};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;

use crate::error::GatewayError;

/// Serves files beneath a single root directory.
///
/// Lookups never escape the root: path components are re-joined one by
/// one and anything that is not a plain name (`..`, an absolute prefix)
/// refuses the lookup outright.
pub struct StaticAssets {
    root: PathBuf,
    index_file: String,
}

impl StaticAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index_file: "index.html".to_string(),
        }
    }

    /// File served when the request path is `/`.
    pub fn index_file(mut self, name: impl Into<String>) -> Self {
        self.index_file = name.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Answer a request from disk. Missing files are a well-formed 404,
    /// not an error; only genuine I/O failures surface as
    /// [`GatewayError::Asset`].
    ///
    /// Desugared by hand so the returned future does not capture the
    /// request reference: `Request<Body>` is not `Sync`, and the pipeline
    /// needs this future to be `Send`.
    pub fn serve(
        &self,
        request: &Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, GatewayError>> + Send {
        let resolved = self.resolve(request.uri().path());
        async move {
            let Some(file) = resolved else {
                return Ok(not_found());
            };

            match tokio::fs::read(&file).await {
                Ok(contents) => {
                    tracing::debug!(file = %file.display(), bytes = contents.len(), "asset served");
                    Ok(Response::builder()
                        .status(StatusCode::OK)
                        .header(header::CONTENT_TYPE, content_type(&file))
                        .body(Body::from(contents))
                        .unwrap())
                }
                Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(not_found()),
                Err(source) => Err(GatewayError::Asset {
                    path: file.display().to_string(),
                    source,
                }),
            }
        }
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let trimmed = path.trim_start_matches('/');
        let relative = if trimmed.is_empty() {
            self.index_file.as_str()
        } else {
            trimmed
        };

        let mut file = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => file.push(part),
                Component::CurDir => {}
                // Parent references and rooted components would walk out
                // of the asset root.
                _ => return None,
            }
        }
        Some(file)
    }
}

fn not_found() -> Response<Body> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from("Not Found"))
        .unwrap()
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("wasm") => "application/wasm",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
