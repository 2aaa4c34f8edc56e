//! Fallback collaborators for requests no terminal route claims.
//!
//! # Responsibilities
//! - Serve files from a static asset root ([`StaticAssets`])
//! - Pass unmatched requests through to a configured upstream
//!   ([`UpstreamClient`])
//!
//! Precedence lives in the pipeline, not here: assets are consulted
//! before the upstream, and a plain 404 is the last resort when
//! neither is configured.

pub mod assets;
pub mod upstream;

pub use assets::StaticAssets;
pub use upstream::UpstreamClient;
