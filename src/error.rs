//! Error types shared by the catalog client, the recommendation strategies and
//! the configuration layer.
//!
//! Catalog errors travel through the strategies and the engine untouched; the
//! connection handler is the only place that turns them into a message for the
//! wire.

use std::sync::Arc;

use thiserror::Error;

/// Failure while exchanging service credentials for an access token.
///
/// Cloneable so that one failed refresh can be reported to every caller that
/// was waiting on it.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("token request failed: {0}")]
    Transport(#[source] Arc<reqwest::Error>),

    #[error("token endpoint rejected the credentials (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed token response: {0}")]
    Malformed(String),
}

/// Failure while talking to the remote catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("catalog request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("catalog returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed catalog response: {0}")]
    Parse(String),

    #[error("not found in catalog: {0}")]
    NotFound(String),
}

impl CatalogError {
    pub fn is_auth(&self) -> bool {
        matches!(self, CatalogError::Auth(_))
    }

    /// Short description that is safe to send to clients. Upstream URLs,
    /// request paths and response bodies only go to the server log.
    pub fn client_message(&self) -> String {
        match self {
            CatalogError::Auth(_) => "catalog authentication failed".to_string(),
            CatalogError::Transport(_) => "catalog unreachable".to_string(),
            CatalogError::Status { status, .. } => format!("catalog returned status {status}"),
            CatalogError::Parse(_) => "unexpected catalog response".to_string(),
            CatalogError::NotFound(_) => "not found in catalog".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}
