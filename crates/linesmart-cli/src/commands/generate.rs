//! Training, SOP and safety generation.

use super::print_json;
use linesmart_core::Orchestrator;
use linesmart_provider::{GenerationContext, GenerationOptions, GenerationRequest};
use serde_json::json;
use tracing::warn;

pub async fn training(
    orchestrator: &Orchestrator,
    prompt: &str,
    context: GenerationContext,
    options: GenerationOptions,
    raw: bool,
) -> anyhow::Result<()> {
    let request = GenerationRequest {
        prompt: prompt.to_string(),
        context,
        options,
    };

    if raw {
        let result = orchestrator.generate_training_content(&request).await?;
        return print_json(&result);
    }

    let generated = orchestrator.generate_training_document(&request).await?;
    if generated.degraded {
        warn!(provider = %generated.provider, "Model output was not valid JSON; showing the raw text as one section");
    }
    print_json(&json!({
        "success": true,
        "data": generated.document,
        "meta": {
            "provider": generated.provider,
            "model": generated.model,
            "usage": generated.usage,
            "partial": generated.partial,
            "degraded": generated.degraded,
        }
    }))
}

pub async fn sop(
    orchestrator: &Orchestrator,
    prompt: &str,
    context: GenerationContext,
    options: GenerationOptions,
) -> anyhow::Result<()> {
    let request = GenerationRequest {
        prompt: prompt.to_string(),
        context,
        options,
    };
    let result = orchestrator.generate_sop(&request).await?;
    print_json(&json!({
        "success": true,
        "data": { "sop": result.content },
        "meta": {
            "provider": result.provider,
            "model": result.model,
            "usage": result.usage,
        }
    }))
}

pub async fn safety(
    orchestrator: &Orchestrator,
    scenario: &str,
    context: GenerationContext,
    options: GenerationOptions,
) -> anyhow::Result<()> {
    let content = orchestrator
        .generate_safety_content(scenario, &context, &options)
        .await?;
    print_json(&json!({ "success": true, "data": { "content": content } }))
}
