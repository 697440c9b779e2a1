//! linesmart-provider: AI backend abstraction and implementations.
//!
//! One [`Provider`] contract over OpenAI, Claude, Gemini, Grok and Llama,
//! plus the metrics store every adapter reports into and the pipeline that
//! recovers structured training data from model text.

pub mod document;
mod error;
pub mod kind;
pub mod metrics;
pub mod prompts;
pub mod providers;
pub mod recovery;
pub mod traits;
pub mod types;

pub use document::{QuizQuestion, TrainingContent, TrainingDocument, TrainingSection};
pub use error::ProviderError;
pub use kind::{ProviderKind, UnknownProviderError};
pub use metrics::{
    HealthSummary, MetricsCollector, MetricsReport, OverallHealth, ProviderMetrics,
    ProviderStatus, RequestContext,
};
pub use recovery::{recover, recover_quiz, Recovered};
pub use traits::Provider;
pub use types::{
    ChatRequest, ContextDocument, EmbeddingItem, EmployeeProfile, FinishReason,
    GenerationContext, GenerationOptions, GenerationRequest, HealthReport, HealthStatus,
    NormalizedResult, Usage,
};
