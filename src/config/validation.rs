//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile every route and mount pattern so bad patterns fail at
//!   startup, not on the first matching request
//! - Validate value ranges (addresses parse, timeouts > 0)
//! - Detect duplicate route names
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use axum::http::uri::Authority;
use axum::http::Method;

use crate::config::schema::GatewayConfig;
use crate::pattern::{compile, CompileOptions};

/// One semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            "not a valid socket address",
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must be greater than zero",
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "not a valid socket address",
        ));
    }

    if let Some(assets) = &config.assets {
        if assets.root.is_empty() {
            errors.push(ValidationError::new("assets.root", "must not be empty"));
        }
        if assets.index_file.is_empty() {
            errors.push(ValidationError::new(
                "assets.index_file",
                "must not be empty",
            ));
        }
    }

    if let Some(upstream) = &config.upstream {
        if upstream.address.parse::<Authority>().is_err() {
            errors.push(ValidationError::new(
                "upstream.address",
                "not a valid host or host:port authority",
            ));
        }
    }

    let mut seen_names = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if let Err(error) = compile(&route.route, &CompileOptions::default()) {
            errors.push(ValidationError::new(
                format!("routes[{index}].route"),
                error.to_string(),
            ));
        }
        if let Err(error) = compile(&route.mount, &CompileOptions::prefix()) {
            errors.push(ValidationError::new(
                format!("routes[{index}].mount"),
                error.to_string(),
            ));
        }
        if !route.method.is_empty()
            && Method::from_bytes(route.method.to_uppercase().as_bytes()).is_err()
        {
            errors.push(ValidationError::new(
                format!("routes[{index}].method"),
                format!("invalid method {:?}", route.method),
            ));
        }
        if route.middleware.is_empty() && route.terminal.is_empty() {
            errors.push(ValidationError::new(
                format!("routes[{index}]"),
                "declares no middleware or terminal handlers",
            ));
        }
        if !route.name.is_empty() && !seen_names.insert(route.name.clone()) {
            errors.push(ValidationError::new(
                format!("routes[{index}].name"),
                format!("duplicate route name {:?}", route.name),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
