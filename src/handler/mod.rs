//! Handler contract and registry.
//!
//! # Responsibilities
//! - Define the [`Handler`] trait every middleware and terminal stage
//!   implements
//! - Map configuration-file handler names to live handler instances via
//!   [`HandlerRegistry`]
//! - Ship the built-in handlers the default registry carries
//!
//! # Design Decisions
//! - Handlers receive a mutable [`StageContext`] rather than owning the
//!   request, so a stage can inspect and mutate the request in place and
//!   still let later stages see it
//! - Handlers are `Arc`-shared and must be `Send + Sync`; one instance
//!   serves every connection concurrently

pub mod builtin;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::response::Response;

use crate::error::GatewayError;
use crate::pipeline::StageContext;

pub use builtin::{AccessLog, Health};

/// One stage of the request pipeline.
///
/// A middleware handler typically calls [`StageContext::proceed`] and
/// decorates the response on the way back out; a terminal handler builds
/// the response itself. Either kind may refuse by returning an error,
/// which the pipeline reduces into a diagnostic 500.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn invoke(&self, ctx: &mut StageContext<'_, '_>) -> Result<Response<Body>, GatewayError>;
}

/// Name-to-handler map used when building a route table from
/// configuration.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the built-in handlers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("access_log", Arc::new(AccessLog));
        registry.register("health", Arc::new(Health));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn Handler>) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
