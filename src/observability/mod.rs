//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handling produces:
//!     → tracing events (structured fields, request IDs)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Logging goes through `tracing`; the subscriber is installed once
//!   in `main` with an env-filter override
//! - Request IDs are set and propagated by tower-http layers
//! - Metrics are cheap (atomic increments) and labeled by method,
//!   status, and dispatch outcome

pub mod metrics;
