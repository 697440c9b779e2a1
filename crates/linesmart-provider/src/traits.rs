//! Provider trait definition.

use crate::document::QuizQuestion;
use crate::error::ProviderError;
use crate::kind::ProviderKind;
use crate::metrics::MetricsCollector;
use crate::prompts;
use crate::recovery;
use crate::types::{
    ChatRequest, EmbeddingItem, GenerationContext, GenerationOptions, HealthReport,
    NormalizedResult,
};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info};

/// Trait for AI backend adapters.
///
/// Adapters implement one upstream chat call ([`Provider::complete`]) and a
/// cheap liveness probe. The capability operations are provided on top of
/// those and may be overridden where a backend needs different parameters.
/// The optional extensions default to [`ProviderError::Unsupported`].
#[async_trait]
pub trait Provider: Send + Sync {
    /// Which backend this adapter talks to.
    fn kind(&self) -> ProviderKind;

    /// Model used when a request carries no override.
    fn current_model(&self) -> &str;

    /// Whether a usable credential (or local backend) is configured.
    fn is_configured(&self) -> bool;

    /// Shared metrics store.
    fn metrics(&self) -> &MetricsCollector;

    /// Persona preamble for the system message.
    fn system_preamble(&self) -> &str {
        prompts::preamble(self.kind())
    }

    /// Send one chat request upstream.
    async fn complete(&self, request: ChatRequest) -> Result<NormalizedResult, ProviderError>;

    /// Cheap upstream call used by [`Provider::health_check`].
    async fn probe(&self) -> Result<HealthReport, ProviderError>;

    /// [`Provider::complete`], timed and recorded in the metrics store.
    async fn metered(&self, request: ChatRequest) -> Result<NormalizedResult, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::not_configured(self.kind()));
        }

        let ctx = self.metrics().start_request(self.kind());
        match self.complete(request).await {
            Ok(result) => {
                self.metrics().record_success(ctx);
                Ok(result)
            }
            Err(e) => {
                self.metrics().record_error(ctx, &e);
                Err(e)
            }
        }
    }

    /// Generate training text grounded in the context documents.
    async fn generate_training_content(
        &self,
        prompt: &str,
        context: &GenerationContext,
        options: &GenerationOptions,
    ) -> Result<NormalizedResult, ProviderError> {
        let request = ChatRequest::new(prompts::user_message(prompt, context))
            .with_system(prompts::system_message(self.system_preamble(), context))
            .with_options(options);

        info!(
            provider = %self.kind(),
            model = request.model.as_deref().unwrap_or(self.current_model()),
            prompt_len = prompt.len(),
            documents = context.documents.len(),
            "Training content request"
        );

        let result = match self.metered(request).await {
            Ok(result) => result,
            Err(e) => {
                error!(provider = %self.kind(), error = %e, "Training content generation failed");
                return Err(e);
            }
        };

        info!(
            provider = %self.kind(),
            prompt_tokens = result.usage.prompt_tokens,
            completion_tokens = result.usage.completion_tokens,
            finish_reason = ?result.finish_reason,
            "Training content received"
        );
        Ok(result)
    }

    /// Generate `question_count` normalized quiz questions from training text.
    async fn generate_quiz(
        &self,
        content: &str,
        question_count: usize,
    ) -> Result<Vec<QuizQuestion>, ProviderError> {
        let request = ChatRequest::new(prompts::quiz_prompt(content, question_count))
            .with_system(prompts::QUIZ_SYSTEM_PROMPT)
            .with_temperature(0.8)
            .with_max_tokens(2000);

        let result = self.metered(request).await?;
        recovery::recover_quiz(&result.content)
    }

    /// Translate `content` into the language named by `target_language`.
    async fn translate_content(
        &self,
        content: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let request = ChatRequest::new(prompts::translation_prompt(content, target_language))
            .with_system(prompts::TRANSLATION_SYSTEM_PROMPT)
            .with_temperature(0.3);

        Ok(self.metered(request).await?.content)
    }

    /// Report liveness. Never fails: errors become `unhealthy`.
    async fn health_check(&self) -> HealthReport {
        if !self.is_configured() {
            return HealthReport::unavailable("API key not configured");
        }
        match self.probe().await {
            Ok(report) => report,
            Err(e) => HealthReport::unhealthy(e.to_string()),
        }
    }

    async fn generate_embeddings(
        &self,
        _texts: &[String],
    ) -> Result<Vec<EmbeddingItem>, ProviderError> {
        Err(self.unsupported("embeddings"))
    }

    async fn analyze_employee_performance(
        &self,
        _employee_data: &Value,
    ) -> Result<String, ProviderError> {
        Err(self.unsupported("performance analysis"))
    }

    async fn generate_safety_content(
        &self,
        _scenario: &str,
        _context: &GenerationContext,
    ) -> Result<String, ProviderError> {
        Err(self.unsupported("safety content"))
    }

    async fn generate_sop(
        &self,
        _prompt: &str,
        _context: &GenerationContext,
        _options: &GenerationOptions,
    ) -> Result<NormalizedResult, ProviderError> {
        Err(self.unsupported("SOP generation"))
    }

    /// The error returned by extensions this backend lacks.
    fn unsupported(&self, operation: &'static str) -> ProviderError {
        ProviderError::Unsupported {
            provider: self.kind(),
            operation,
        }
    }
}

// Compile-time check: Provider must be object-safe
const _: () = {
    fn _assert_object_safe(_: &dyn Provider) {}
};
