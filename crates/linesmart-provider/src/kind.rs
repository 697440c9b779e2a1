//! The closed set of AI backends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the five supported AI backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ProviderKind {
    /// OpenAI chat completions.
    OpenAi,
    /// Anthropic Claude.
    Claude,
    /// Google Gemini.
    Gemini,
    /// xAI Grok.
    Grok,
    /// Llama through Ollama (local) or Replicate (cloud).
    Llama,
}

impl ProviderKind {
    /// Every provider, in registration order.
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::OpenAi,
        ProviderKind::Claude,
        ProviderKind::Gemini,
        ProviderKind::Grok,
        ProviderKind::Llama,
    ];

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Claude => "claude",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Grok => "grok",
            ProviderKind::Llama => "llama",
        }
    }

    /// Comma-separated list of every valid name.
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = UnknownProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownProviderError {
                requested: s.to_string(),
            })
    }
}

impl TryFrom<String> for ProviderKind {
    type Error = UnknownProviderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Error returned when a provider name is not one of [`ProviderKind::ALL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProviderError {
    requested: String,
}

impl UnknownProviderError {
    /// The name that failed to resolve.
    pub fn requested(&self) -> &str {
        &self.requested
    }
}

impl fmt::Display for UnknownProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown AI provider: {}. Available: {}",
            self.requested,
            ProviderKind::valid_names()
        )
    }
}

impl std::error::Error for UnknownProviderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("CLAUDE".parse::<ProviderKind>().unwrap(), ProviderKind::Claude);
        assert_eq!(" llama ".parse::<ProviderKind>().unwrap(), ProviderKind::Llama);
    }

    #[test]
    fn test_unknown_provider_lists_valid_names() {
        let err = "mistral".parse::<ProviderKind>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("mistral"));
        for kind in ProviderKind::ALL {
            assert!(msg.contains(kind.as_str()), "missing {kind} in: {msg}");
        }
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&ProviderKind::OpenAi).unwrap();
        assert_eq!(json, "\"openai\"");
        let parsed: ProviderKind = serde_json::from_str("\"Gemini\"").unwrap();
        assert_eq!(parsed, ProviderKind::Gemini);
    }

    #[test]
    fn test_deserialize_rejects_unknown_name() {
        let err = serde_json::from_str::<ProviderKind>("\"bard\"").unwrap_err();
        assert!(err.to_string().contains("Available: openai, claude, gemini, grok, llama"));
    }
}
