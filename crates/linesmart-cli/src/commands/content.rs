//! Quiz, translation, analysis and embeddings.

use super::print_json;
use anyhow::Context;
use linesmart_core::Orchestrator;
use linesmart_provider::ProviderKind;
use serde_json::{json, Value};

pub async fn quiz(
    orchestrator: &Orchestrator,
    content: &str,
    count: usize,
    provider: Option<ProviderKind>,
) -> anyhow::Result<()> {
    let questions = orchestrator.generate_quiz(content, count, provider).await?;
    print_json(&json!({ "success": true, "data": { "quiz": questions } }))
}

pub async fn translate(
    orchestrator: &Orchestrator,
    content: &str,
    target_language: &str,
    provider: Option<ProviderKind>,
) -> anyhow::Result<()> {
    let translated = orchestrator
        .translate_content(content, target_language, provider)
        .await?;
    print_json(&json!({
        "success": true,
        "data": { "translatedContent": translated, "targetLanguage": target_language }
    }))
}

pub async fn analyze(
    orchestrator: &Orchestrator,
    raw: &str,
    provider: Option<ProviderKind>,
) -> anyhow::Result<()> {
    let employee_data: Value =
        serde_json::from_str(raw).context("Employee data must be valid JSON")?;
    let analysis = orchestrator
        .analyze_employee_performance(&employee_data, provider)
        .await?;
    print_json(&json!({ "success": true, "data": { "analysis": analysis } }))
}

pub async fn embed(orchestrator: &Orchestrator, texts: &[String]) -> anyhow::Result<()> {
    let embeddings = orchestrator.generate_embeddings(texts).await?;
    print_json(&json!({ "success": true, "data": { "embeddings": embeddings } }))
}
