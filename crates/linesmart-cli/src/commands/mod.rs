//! Subcommand implementations. Results go to stdout as pretty JSON.

pub mod config;
pub mod content;
pub mod generate;
pub mod status;

use crate::cli::{Cli, Commands, ContextArgs, InputArgs, TuningArgs};
use anyhow::Context;
use linesmart_core::Orchestrator;
use linesmart_provider::{ContextDocument, EmployeeProfile, GenerationContext, GenerationOptions};
use serde::Serialize;
use std::fs;

/// Dispatch every subcommand except `config`, which runs without an orchestrator.
pub async fn run(cli: Cli, orchestrator: &Orchestrator) -> anyhow::Result<()> {
    let options = |tuning: &TuningArgs| GenerationOptions {
        provider: cli.provider,
        model: cli.model.clone(),
        max_tokens: tuning.max_tokens,
        temperature: tuning.temperature,
        top_p: None,
        enable_fallback: cli.fallback.is_some(),
        fallback_provider: cli.fallback,
    };

    match &cli.command {
        Commands::Generate {
            prompt,
            raw,
            context,
            tuning,
        } => generate::training(orchestrator, prompt, build_context(context)?, options(tuning), *raw).await,
        Commands::Sop {
            prompt,
            context,
            tuning,
        } => generate::sop(orchestrator, prompt, build_context(context)?, options(tuning)).await,
        Commands::Safety {
            scenario,
            context,
            tuning,
        } => generate::safety(orchestrator, scenario, build_context(context)?, options(tuning)).await,
        Commands::Quiz { input, count } => {
            content::quiz(orchestrator, &read_input(input)?, *count, cli.provider).await
        }
        Commands::Translate {
            input,
            target_language,
        } => content::translate(orchestrator, &read_input(input)?, target_language, cli.provider).await,
        Commands::Analyze { input } => content::analyze(orchestrator, &read_input(input)?, cli.provider).await,
        Commands::Embed { texts } => content::embed(orchestrator, texts).await,
        Commands::Providers => status::providers(orchestrator),
        Commands::Health { target } => status::health(orchestrator, *target).await,
        Commands::Recommend { task } => status::recommend(orchestrator, task),
        Commands::Metrics { target } => status::metrics(orchestrator, target.as_deref()),
        Commands::HealthSummary => print_json(&orchestrator.metrics().health_summary()),
        Commands::Config { .. } => anyhow::bail!("config is handled before provider setup"),
    }
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_input(input: &InputArgs) -> anyhow::Result<String> {
    match (&input.content, &input.file) {
        (Some(content), _) => Ok(content.clone()),
        (None, Some(path)) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        (None, None) => anyhow::bail!("Content is required"),
    }
}

/// Load context documents and assemble the employee profile, if any field was given.
pub fn build_context(args: &ContextArgs) -> anyhow::Result<GenerationContext> {
    let documents = args
        .documents
        .iter()
        .map(|path| {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read document {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(ContextDocument { name, content })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let has_profile = args.department.is_some()
        || args.position.is_some()
        || args.language.is_some()
        || args.experience.is_some();
    let employee = has_profile.then(|| EmployeeProfile {
        department: args.department.clone().unwrap_or_default(),
        position: args.position.clone().unwrap_or_default(),
        language: args.language.clone().unwrap_or_else(|| "en".to_string()),
        experience_level: args.experience.clone(),
    });

    Ok(GenerationContext {
        documents,
        employee,
        requirements: args.requirements.clone(),
    })
}
