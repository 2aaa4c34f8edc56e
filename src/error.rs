//! Request-time error taxonomy.
//!
//! Pattern and table errors are startup-time concerns and live with their
//! modules; everything that can fail while a request is in flight funnels
//! into [`GatewayError`] so the error-capture stage can reduce it into one
//! diagnostic response.

use thiserror::Error;

/// Boxed error type handlers hand back when they fail.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// A handler broke the stage contract (for example, replacing the
    /// shared data bag with a non-object value).
    #[error("handler contract violation: {0}")]
    ContractViolation(String),

    /// A middleware or terminal handler failed. The cause chain is
    /// preserved for the reduced diagnostic body.
    #[error("{source}")]
    Handler {
        #[source]
        source: BoxError,
    },

    /// The outbound pass-through call failed.
    #[error("upstream request failed")]
    Upstream {
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    /// The asset collaborator failed on something other than a missing
    /// file (missing files are plain 404 responses, not errors).
    #[error("failed to read asset {path:?}")]
    Asset {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl GatewayError {
    /// Wrap an arbitrary handler failure.
    pub fn handler(source: impl Into<BoxError>) -> Self {
        GatewayError::Handler {
            source: source.into(),
        }
    }

    /// Diagnostic name surfaced as the reduced error's `name` field.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            GatewayError::ContractViolation(_) => "HandlerContractViolation",
            GatewayError::Handler { .. } => "Error",
            GatewayError::Upstream { .. } => "UpstreamError",
            GatewayError::Asset { .. } => "AssetError",
        }
    }
}

impl From<BoxError> for GatewayError {
    fn from(source: BoxError) -> Self {
        GatewayError::Handler { source }
    }
}
