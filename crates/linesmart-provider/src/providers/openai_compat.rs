//! Generic OpenAI-compatible transport.
//!
//! Speaks the chat completions protocol used by OpenAI and xAI. Adapters
//! wrap a [`OpenAiCompatClient`] and add their own extensions.

use crate::error::ProviderError;
use crate::kind::ProviderKind;
use crate::providers::{decode, http_client, trim_base_url};
use crate::types::{ChatRequest, FinishReason, NormalizedResult, Usage};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Configuration for an OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAiCompatConfig {
    pub kind: ProviderKind,
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    /// Used when the request carries no temperature.
    pub temperature: f32,
    pub timeout: Duration,
}

/// A client that speaks the OpenAI chat completions protocol.
#[derive(Debug)]
pub struct OpenAiCompatClient {
    config: OpenAiCompatConfig,
    client: Client,
}

impl OpenAiCompatClient {
    pub fn new(mut config: OpenAiCompatConfig) -> Result<Self, ProviderError> {
        config.base_url = trim_base_url(config.base_url);
        config.api_key = config.api_key.filter(|key| !key.trim().is_empty());
        let client = http_client(config.kind, config.timeout)?;
        Ok(Self { config, client })
    }

    pub fn kind(&self) -> ProviderKind {
        self.config.kind
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::not_configured(self.config.kind))
    }

    /// Build the JSON request body.
    pub(crate) fn build_request_body(&self, request: &ChatRequest) -> Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": request.user}));

        json!({
            "model": request.model.as_deref().unwrap_or(&self.config.model),
            "messages": messages,
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
            "temperature": request.temperature.unwrap_or(self.config.temperature),
            "top_p": request.top_p.unwrap_or(1.0),
            "stream": false,
        })
    }

    /// POST `body` to `{base_url}/{path}` with bearer auth and decode the reply.
    pub(crate) async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, ProviderError> {
        let url = format!("{}/{path}", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key()?)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::http(self.config.kind, e))?;

        decode(self.config.kind, response).await
    }

    /// Send one non-streaming chat completion.
    pub async fn chat(&self, request: &ChatRequest) -> Result<NormalizedResult, ProviderError> {
        let body = self.build_request_body(request);
        debug!(provider = %self.config.kind, model = %body["model"], "POST chat/completions");

        let resp: ChatCompletion = self.post("chat/completions", &body).await?;
        self.normalize(resp, request)
    }

    fn normalize(
        &self,
        resp: ChatCompletion,
        request: &ChatRequest,
    ) -> Result<NormalizedResult, ProviderError> {
        let choice = resp.choices.into_iter().next().ok_or_else(|| {
            ProviderError::upstream(self.config.kind, "No choices in response")
        })?;

        let usage = resp
            .usage
            .map(|u| Usage::from_counts(u.prompt_tokens, u.completion_tokens, u.total_tokens))
            .unwrap_or_default();

        let model = resp
            .model
            .or_else(|| request.model.clone())
            .unwrap_or_else(|| self.config.model.clone());

        Ok(NormalizedResult {
            content: choice.message.content.unwrap_or_default(),
            model,
            usage,
            finish_reason: FinishReason::from_upstream(choice.finish_reason.as_deref()),
            provider: self.config.kind,
        })
    }

    /// `GET /models`; returns the number of models listed.
    pub async fn list_models(&self, timeout: Duration) -> Result<usize, ProviderError> {
        let url = format!("{}/models", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(self.api_key()?)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ProviderError::http(self.config.kind, e))?;

        let list: ModelList = decode(self.config.kind, response).await?;
        Ok(list.data.len())
    }
}

// ──────────────────────────────────────────────────────────
// Response types for deserialization
// ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    #[serde(default)]
    prompt_tokens: Option<u64>,
    #[serde(default)]
    completion_tokens: Option<u64>,
    #[serde(default)]
    total_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<Value>,
}
