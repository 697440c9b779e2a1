//! Error types for the linesmart-provider crate.

use crate::kind::{ProviderKind, UnknownProviderError};

/// Errors that can occur in AI provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Backend has no usable credential
    #[error("{provider} is not available: {message}")]
    Configuration {
        provider: ProviderKind,
        message: String,
    },

    /// Network failure, non-2xx response, or an error reported by the upstream API
    #[error("{provider} request failed: {message}")]
    Upstream {
        provider: ProviderKind,
        message: String,
    },

    /// Model output could not be recovered into the expected structure
    #[error("{0}")]
    ResponseFormat(String),

    /// Caller input rejected before any upstream call
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Provider name did not resolve
    #[error(transparent)]
    UnknownProvider(#[from] UnknownProviderError),

    /// The selected adapter does not implement the operation
    #[error("Unsupported operation: {operation} is not supported by {provider}")]
    Unsupported {
        provider: ProviderKind,
        operation: &'static str,
    },

    /// Both the primary and the fallback attempt failed
    #[error("{primary}; fallback also failed: {fallback}")]
    FallbackExhausted {
        primary: Box<ProviderError>,
        fallback: Box<ProviderError>,
    },
}

impl ProviderError {
    /// Build an upstream error tagged with the provider.
    pub fn upstream(provider: ProviderKind, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider,
            message: message.into(),
        }
    }

    /// Map a transport error, calling out timeouts explicitly.
    pub fn http(provider: ProviderKind, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else {
            err.to_string()
        };
        Self::upstream(provider, message)
    }

    /// Missing-credential error for the provider.
    pub fn not_configured(provider: ProviderKind) -> Self {
        Self::Configuration {
            provider,
            message: "API key not configured".to_string(),
        }
    }

    /// The provider this error is attributed to, when there is one.
    pub fn provider(&self) -> Option<ProviderKind> {
        match self {
            Self::Configuration { provider, .. }
            | Self::Upstream { provider, .. }
            | Self::Unsupported { provider, .. } => Some(*provider),
            Self::FallbackExhausted { fallback, .. } => fallback.provider(),
            Self::ResponseFormat(_) | Self::InvalidRequest(_) | Self::UnknownProvider(_) => None,
        }
    }
}
