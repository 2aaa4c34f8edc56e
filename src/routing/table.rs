//! Ordered route table construction.

use std::sync::Arc;

use axum::http::Method;
use thiserror::Error;

use crate::config::schema::RouteConfig;
use crate::handler::{Handler, HandlerRegistry};
use crate::pattern::{compile, CompileOptions, Matcher, PatternError};

#[derive(Debug, Error)]
pub enum TableError {
    #[error("route {route:?}: {source}")]
    Pattern {
        route: String,
        #[source]
        source: PatternError,
    },

    #[error("route {route:?}: invalid method {method:?}")]
    Method { route: String, method: String },

    #[error("route {route:?}: no handler named {name:?} is registered")]
    UnknownHandler { route: String, name: String },
}

/// One declared route with its pre-compiled matchers.
///
/// The route pattern is compiled twice on purpose: a prefix-mode form
/// used while collecting middleware, and an exact form used when
/// electing the terminal route. The mount pattern is always prefix-mode
/// since a mount claims a subtree.
pub struct RouteEntry {
    name: String,
    method: Option<Method>,
    route_prefix: Matcher,
    route_exact: Matcher,
    mount: Matcher,
    middleware: Vec<Arc<dyn Handler>>,
    terminal: Vec<Arc<dyn Handler>>,
}

impl RouteEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn allows(&self, method: &Method) -> bool {
        self.method.as_ref().map(|m| m == method).unwrap_or(true)
    }

    pub(crate) fn route_prefix(&self) -> &Matcher {
        &self.route_prefix
    }

    pub(crate) fn route_exact(&self) -> &Matcher {
        &self.route_exact
    }

    pub(crate) fn mount(&self) -> &Matcher {
        &self.mount
    }

    pub(crate) fn middleware(&self) -> &[Arc<dyn Handler>] {
        &self.middleware
    }

    pub(crate) fn terminal(&self) -> &[Arc<dyn Handler>] {
        &self.terminal
    }
}

/// Declaration-ordered list of [`RouteEntry`] values. Immutable once
/// built; dispatch shares it behind an `Arc`.
#[derive(Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// Build a table from configuration, resolving handler names against
    /// the registry. Fails on the first invalid pattern, method, or
    /// unknown handler name.
    pub fn from_config(
        routes: &[RouteConfig],
        registry: &HandlerRegistry,
    ) -> Result<Self, TableError> {
        let mut builder = Self::builder();
        for config in routes {
            let mut def = RouteDef::new(&config.route).mount(&config.mount);
            if !config.name.is_empty() {
                def = def.name(&config.name);
            }
            if !config.method.is_empty() {
                let method = Method::from_bytes(config.method.to_uppercase().as_bytes())
                    .map_err(|_| TableError::Method {
                        route: config.route.clone(),
                        method: config.method.clone(),
                    })?;
                def = def.method(method);
            }
            for name in &config.middleware {
                let handler = registry.get(name).ok_or_else(|| TableError::UnknownHandler {
                    route: config.route.clone(),
                    name: name.clone(),
                })?;
                def = def.middleware(handler);
            }
            for name in &config.terminal {
                let handler = registry.get(name).ok_or_else(|| TableError::UnknownHandler {
                    route: config.route.clone(),
                    name: name.clone(),
                })?;
                def = def.terminal(handler);
            }
            builder = builder.route(def);
        }
        builder.build()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }
}

/// In-code route declaration, the programmatic twin of a `[[routes]]`
/// configuration block.
pub struct RouteDef {
    route: String,
    mount: String,
    name: Option<String>,
    method: Option<Method>,
    middleware: Vec<Arc<dyn Handler>>,
    terminal: Vec<Arc<dyn Handler>>,
}

impl RouteDef {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            mount: "/".to_string(),
            name: None,
            method: None,
            middleware: Vec::new(),
            terminal: Vec::new(),
        }
    }

    pub fn mount(mut self, mount: impl Into<String>) -> Self {
        self.mount = mount.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn middleware(mut self, handler: Arc<dyn Handler>) -> Self {
        self.middleware.push(handler);
        self
    }

    pub fn terminal(mut self, handler: Arc<dyn Handler>) -> Self {
        self.terminal.push(handler);
        self
    }

    fn build(self) -> Result<RouteEntry, TableError> {
        let pattern_error = |route: &str| {
            let route = route.to_string();
            move |source: PatternError| TableError::Pattern {
                route: route.clone(),
                source,
            }
        };

        let route_prefix = Matcher::new(
            compile(&self.route, &CompileOptions::prefix()).map_err(pattern_error(&self.route))?,
        );
        let route_exact = Matcher::new(
            compile(&self.route, &CompileOptions::default()).map_err(pattern_error(&self.route))?,
        );
        let mount = Matcher::new(
            compile(&self.mount, &CompileOptions::prefix()).map_err(pattern_error(&self.mount))?,
        );

        Ok(RouteEntry {
            name: self.name.unwrap_or_else(|| self.route.clone()),
            method: self.method,
            route_prefix,
            route_exact,
            mount,
            middleware: self.middleware,
            terminal: self.terminal,
        })
    }
}

#[derive(Default)]
pub struct RouteTableBuilder {
    routes: Vec<RouteDef>,
}

impl RouteTableBuilder {
    pub fn route(mut self, def: RouteDef) -> Self {
        self.routes.push(def);
        self
    }

    pub fn build(self) -> Result<RouteTable, TableError> {
        let entries = self
            .routes
            .into_iter()
            .map(RouteDef::build)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RouteTable { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_entries_in_declaration_order() {
        let table = RouteTable::builder()
            .route(RouteDef::new("/api/:id"))
            .route(RouteDef::new("/other").name("other-route"))
            .build()
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.entries()[0].name(), "/api/:id");
        assert_eq!(table.entries()[1].name(), "other-route");
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let result = RouteTable::builder().route(RouteDef::new("/(?:x)")).build();
        assert!(matches!(result, Err(TableError::Pattern { route, .. }) if route == "/(?:x)"));
    }

    #[test]
    fn method_filter_defaults_to_any() {
        let table = RouteTable::builder()
            .route(RouteDef::new("/a"))
            .route(RouteDef::new("/b").method(Method::POST))
            .build()
            .unwrap();

        assert!(table.entries()[0].allows(&Method::GET));
        assert!(table.entries()[0].allows(&Method::DELETE));
        assert!(table.entries()[1].allows(&Method::POST));
        assert!(!table.entries()[1].allows(&Method::GET));
    }

    #[test]
    fn from_config_resolves_registered_handlers() {
        use crate::config::schema::RouteConfig;
        use crate::handler::HandlerRegistry;

        let registry = HandlerRegistry::with_builtins();
        let routes = vec![RouteConfig {
            name: "health".to_string(),
            route: "/healthz".to_string(),
            mount: "/".to_string(),
            method: "get".to_string(),
            middleware: vec!["access_log".to_string()],
            terminal: vec!["health".to_string()],
        }];

        let table = RouteTable::from_config(&routes, &registry).unwrap();
        assert_eq!(table.len(), 1);
        let entry = &table.entries()[0];
        assert_eq!(entry.name(), "health");
        assert!(entry.allows(&Method::GET));
        assert!(!entry.allows(&Method::POST));
        assert_eq!(entry.middleware().len(), 1);
        assert_eq!(entry.terminal().len(), 1);
    }

    #[test]
    fn from_config_rejects_unknown_handler_names() {
        use crate::config::schema::RouteConfig;
        use crate::handler::HandlerRegistry;

        let registry = HandlerRegistry::new();
        let routes = vec![RouteConfig {
            name: String::new(),
            route: "/a".to_string(),
            mount: "/".to_string(),
            method: String::new(),
            middleware: Vec::new(),
            terminal: vec!["missing".to_string()],
        }];

        let result = RouteTable::from_config(&routes, &registry);
        assert!(
            matches!(result, Err(TableError::UnknownHandler { name, .. }) if name == "missing")
        );
    }

    #[test]
    fn from_config_rejects_malformed_methods() {
        use crate::config::schema::RouteConfig;
        use crate::handler::HandlerRegistry;

        let registry = HandlerRegistry::new();
        let routes = vec![RouteConfig {
            name: String::new(),
            route: "/a".to_string(),
            mount: "/".to_string(),
            method: "not a method".to_string(),
            middleware: Vec::new(),
            terminal: Vec::new(),
        }];

        let result = RouteTable::from_config(&routes, &registry);
        assert!(matches!(result, Err(TableError::Method { .. })));
    }
}
