//! Error types for the linesmart-core crate.

use linesmart_provider::UnknownProviderError;

/// Errors raised while loading or resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `DEFAULT_AI_PROVIDER` (or the stored default) names no known provider
    #[error("Invalid default provider: {0}")]
    InvalidDefaultProvider(#[from] UnknownProviderError),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
