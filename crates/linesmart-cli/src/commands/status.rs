//! Provider listing, health, recommendations and metrics.

use super::print_json;
use linesmart_core::Orchestrator;
use linesmart_provider::ProviderKind;
use serde_json::json;
use std::collections::BTreeMap;

pub fn providers(orchestrator: &Orchestrator) -> anyhow::Result<()> {
    print_json(&orchestrator.list_providers())
}

pub async fn health(orchestrator: &Orchestrator, provider: Option<ProviderKind>) -> anyhow::Result<()> {
    match provider {
        Some(kind) => {
            let report = orchestrator.health_check(kind).await?;
            print_json(&BTreeMap::from([(kind, report)]))
        }
        None => print_json(&orchestrator.health_check_all().await),
    }
}

pub fn recommend(orchestrator: &Orchestrator, task: &str) -> anyhow::Result<()> {
    let provider = orchestrator.recommend_provider(task);
    print_json(&json!({ "taskType": task, "recommendedProvider": provider }))
}

pub fn metrics(orchestrator: &Orchestrator, provider: Option<&str>) -> anyhow::Result<()> {
    let collector = orchestrator.metrics();
    match provider {
        Some(name) => match collector.provider_metrics(name)? {
            Some(metrics) => print_json(&metrics),
            None => anyhow::bail!("No metrics recorded for {name}"),
        },
        None => print_json(&collector.all_metrics()),
    }
}
