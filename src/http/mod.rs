//! HTTP serving surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware layers)
//!     → request ID set + propagated (tower-http)
//!     → dispatch handler → execution pipeline
//!     → response (outcome recorded in metrics)
//! ```

pub mod server;

pub use server::{AppState, GatewayServer};
