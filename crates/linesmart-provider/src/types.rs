//! Common types used by the provider trait and implementations.

use crate::kind::ProviderKind;
use serde::{Deserialize, Serialize};

/// A company document passed to the model as grounding context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDocument {
    /// Display name.
    pub name: String,
    /// Full text.
    pub content: String,
}

/// The employee the content is being generated for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeeProfile {
    pub department: String,
    pub position: String,
    pub language: String,
    pub experience_level: Option<String>,
}

/// Grounding context for a generation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationContext {
    /// Documents, in the order they should be presented.
    pub documents: Vec<ContextDocument>,
    /// Employee profile, if the content is personalized.
    pub employee: Option<EmployeeProfile>,
    /// Extra free-text requirements appended to the prompt.
    pub requirements: Option<String>,
}

/// Caller options for a generation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationOptions {
    /// Explicit provider; otherwise the task default applies.
    pub provider: Option<ProviderKind>,
    /// Model override for this call.
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    /// Retry once on `fallback_provider` if the primary fails.
    pub enable_fallback: bool,
    pub fallback_provider: Option<ProviderKind>,
}

/// A full generation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationRequest {
    pub prompt: String,
    pub context: GenerationContext,
    pub options: GenerationOptions,
}

/// One upstream chat call: a system text and a single user turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatRequest {
    /// System prompt.
    pub system: Option<String>,
    /// User message.
    pub user: String,
    /// Model override; adapters fall back to their configured model.
    pub model: Option<String>,
    /// Maximum tokens in the response; adapters fall back to their default.
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
}

impl ChatRequest {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Copy model and sampling overrides from caller options.
    pub fn with_options(mut self, options: &GenerationOptions) -> Self {
        if options.model.is_some() {
            self.model = options.model.clone();
        }
        if options.max_tokens.is_some() {
            self.max_tokens = options.max_tokens;
        }
        if options.temperature.is_some() {
            self.temperature = options.temperature;
        }
        if options.top_p.is_some() {
            self.top_p = options.top_p;
        }
        self
    }
}

/// Token usage information. Zero-filled when the upstream omits it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    /// Build usage from optional counts; the total is summed when not reported.
    pub fn from_counts(prompt: Option<u64>, completion: Option<u64>, total: Option<u64>) -> Self {
        let prompt_tokens = prompt.unwrap_or(0);
        let completion_tokens = completion.unwrap_or(0);
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: total.unwrap_or(prompt_tokens + completion_tokens),
        }
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end or stop sequence.
    Stop,
    /// Token limit reached.
    Length,
    /// Upstream reported a failure or blocked the output.
    Error,
}

impl FinishReason {
    /// Map any backend's finish/stop reason string.
    pub fn from_upstream(reason: Option<&str>) -> Self {
        match reason.map(|r| r.to_ascii_lowercase()).as_deref() {
            Some("length" | "max_tokens" | "max_output_tokens") => FinishReason::Length,
            Some("error" | "failed" | "canceled" | "safety" | "recitation" | "blocklist") => {
                FinishReason::Error
            }
            _ => FinishReason::Stop,
        }
    }
}

/// Provider-independent result of a generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    pub content: String,
    pub model: String,
    pub usage: Usage,
    pub finish_reason: FinishReason,
    pub provider: ProviderKind,
}

/// Outcome of a health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Unavailable,
}

/// Result of `Provider::health_check`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Number of models the backend reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<usize>,
    /// Concrete backend behind the adapter (e.g. `ollama`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            model: None,
            models: None,
            backend: None,
            error: None,
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            error: Some(error.into()),
            ..Self::healthy()
        }
    }

    pub fn unavailable(error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unavailable,
            error: Some(error.into()),
            ..Self::healthy()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_models(mut self, count: usize) -> Self {
        self.models = Some(count);
        self
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// One embedding vector, tagged with the index of its input text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingItem {
    pub embedding: Vec<f32>,
    pub index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_zero_fills_and_sums() {
        let usage = Usage::from_counts(Some(12), None, None);
        assert_eq!(usage.prompt_tokens, 12);
        assert_eq!(usage.completion_tokens, 0);
        assert_eq!(usage.total_tokens, 12);

        let usage = Usage::from_counts(Some(1), Some(2), Some(10));
        assert_eq!(usage.total_tokens, 10);
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(FinishReason::from_upstream(Some("stop")), FinishReason::Stop);
        assert_eq!(FinishReason::from_upstream(Some("end_turn")), FinishReason::Stop);
        assert_eq!(FinishReason::from_upstream(Some("STOP")), FinishReason::Stop);
        assert_eq!(FinishReason::from_upstream(Some("max_tokens")), FinishReason::Length);
        assert_eq!(FinishReason::from_upstream(Some("MAX_TOKENS")), FinishReason::Length);
        assert_eq!(FinishReason::from_upstream(Some("SAFETY")), FinishReason::Error);
        assert_eq!(FinishReason::from_upstream(None), FinishReason::Stop);
    }

    #[test]
    fn test_chat_request_takes_option_overrides() {
        let options = GenerationOptions {
            model: Some("gpt-4o".to_string()),
            max_tokens: Some(4000),
            ..Default::default()
        };
        let req = ChatRequest::new("hi").with_temperature(0.3).with_options(&options);
        assert_eq!(req.model.as_deref(), Some("gpt-4o"));
        assert_eq!(req.max_tokens, Some(4000));
        assert_eq!(req.temperature, Some(0.3));
    }

    #[test]
    fn test_generation_request_deserializes_camel_case() {
        let json = r#"{
            "prompt": "Lockout/tagout",
            "context": {"documents": [{"name": "LOTO.pdf", "content": "Step 1"}],
                        "employee": {"department": "Maintenance", "position": "Tech", "language": "es"}},
            "options": {"provider": "Claude", "maxTokens": 4000, "enableFallback": true, "fallbackProvider": "openai"}
        }"#;
        let req: GenerationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.options.provider, Some(ProviderKind::Claude));
        assert_eq!(req.options.fallback_provider, Some(ProviderKind::OpenAi));
        assert!(req.options.enable_fallback);
        assert_eq!(req.context.documents.len(), 1);
        assert!(req.context.employee.unwrap().experience_level.is_none());
    }

    #[test]
    fn test_health_report_skips_empty_fields() {
        let json = serde_json::to_value(HealthReport::unavailable("API key not configured")).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert!(json.get("model").is_none());
    }
}
