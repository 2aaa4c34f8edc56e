//! Pattern-routed edge gateway library.

pub mod config;
pub mod error;
pub mod fallback;
pub mod handler;
pub mod http;
pub mod observability;
pub mod pattern;
pub mod pipeline;
pub mod routing;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use handler::{Handler, HandlerRegistry};
pub use http::GatewayServer;
pub use pattern::{compile, CompileOptions, Matcher, PatternError};
pub use pipeline::{DispatchOutcome, ExecutionPipeline, StageContext};
pub use routing::{RouteDef, RouteTable};
