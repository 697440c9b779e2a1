//! Backend adapters.

pub mod anthropic;
pub mod gemini;
pub mod grok;
pub mod llama;
pub mod openai;
pub mod openai_compat;

use crate::error::ProviderError;
use crate::kind::ProviderKind;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Build an HTTP client with a whole-request timeout.
pub(crate) fn http_client(kind: ProviderKind, timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::Configuration {
            provider: kind,
            message: format!("failed to build HTTP client: {e}"),
        })
}

/// Decode a JSON response body, turning non-2xx statuses into upstream errors.
pub(crate) async fn decode<T: DeserializeOwned>(
    kind: ProviderKind,
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(ProviderError::upstream(
            kind,
            format!("HTTP {status}: {}", error_message(&body)),
        ));
    }

    response
        .json()
        .await
        .map_err(|e| ProviderError::upstream(kind, format!("invalid response body: {e}")))
}

/// Pull `error.message` (or a string `error`) out of an error body.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };
    match value.get("error") {
        Some(Value::String(message)) => message.clone(),
        Some(error) => error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| body.trim().to_string()),
        None => body.trim().to_string(),
    }
}

/// Strip trailing slashes so paths can be appended with `/`.
pub(crate) fn trim_base_url(url: impl Into<String>) -> String {
    let url = url.into();
    url.trim_end_matches('/').to_string()
}
