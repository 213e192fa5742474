/// # corpus-harvester CLI Interface (Module)
///
/// Command parsing and orchestration for the corpus pipeline. Every stage is
/// a subcommand and each stage reads its inputs from the previous stage's
/// outputs on disk:
///
/// - `harvest`: discover repositories per category and store qualifying files under `output_dir`
/// - `merge`: flatten `output_dir` into the delimited corpus at `corpus_path`
/// - `train`: hand the corpus to the configured training command
/// - `generate`: produce a completion from the trained model in `model_dir`
///
/// All pipeline logic lives in `corpus-harvester-core`; this module only wires
/// configuration, credentials and the concrete collaborators together.
use crate::collaborator::{CommandGenerator, CommandTrainer};
use crate::github::GitHubClient;
use crate::load_config::{load_or_default, load_token};
use anyhow::Result;
use clap::{Parser, Subcommand};
use corpus_harvester_core::contract::{GenerationRequest, Generator, Trainer, TrainingRequest};
use corpus_harvester_core::harvest::{harvest, HarvestReport};
use corpus_harvester_core::merge::merge_corpus;
use std::path::PathBuf;
use std::time::Duration;

/// Prompt used by `generate` when none is given.
pub const DEFAULT_PROMPT: &str = "import React from 'react';\n// Component for Navigation Bar\nconst Navbar =";

/// CLI for corpus-harvester: build a code corpus from popular GitHub repositories.
#[derive(Parser)]
#[clap(
    name = "corpus-harvester",
    version,
    about = "Harvest source files from popular GitHub repositories into a language-model training corpus"
)]
pub struct Cli {
    /// Path to the YAML config file; defaults apply when omitted
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover repositories and download qualifying files (requires GITHUB_TOKEN)
    Harvest,
    /// Merge the harvested files into the training corpus
    Merge,
    /// Train a model on the corpus with the configured training command
    Train,
    /// Generate a completion with the trained model
    Generate {
        #[clap(long, default_value = DEFAULT_PROMPT)]
        prompt: String,
        /// Overrides `generation.max_length` from the config
        #[clap(long)]
        max_length: Option<usize>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let config = load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Harvest => {
            let token = load_token()?;
            tracing::info!(command = "harvest", "Starting harvesting run");
            let client = GitHubClient::new(
                &config.api_base_url,
                token,
                Duration::from_secs(config.request_timeout_secs),
            )
            .map_err(|e| anyhow::anyhow!("Failed to construct GitHub client: {e}"))?;
            let report = harvest(&config, &client).await;
            print_harvest_summary(&report);
            tracing::info!(
                command = "harvest",
                accepted = report.accepted_files(),
                "Harvesting complete"
            );
            Ok(())
        }
        Commands::Merge => {
            tracing::info!(command = "merge", "Starting corpus merge");
            match merge_corpus(&config) {
                Ok(report) => {
                    for (path, reason) in &report.skipped {
                        println!("Skipped {}: {reason}", path.display());
                    }
                    println!(
                        "Preprocessing complete. {} files merged into {}",
                        report.merged,
                        config.corpus_path.display()
                    );
                    tracing::info!(command = "merge", ?report, "Corpus merge complete");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "merge", error = %e, "Corpus merge failed");
                    Err(e.into())
                }
            }
        }
        Commands::Train => {
            let request = TrainingRequest::from_config(&config);
            CommandTrainer::from_config(&config).train(&request).await?;
            println!("Model saved to {}", request.output_dir.display());
            Ok(())
        }
        Commands::Generate { prompt, max_length } => {
            let request = GenerationRequest {
                model_dir: config.model_dir.clone(),
                prompt,
                max_length: max_length.unwrap_or(config.generation.max_length),
            };
            let text = CommandGenerator::from_config(&config)
                .generate(&request)
                .await?;
            let rule = "=".repeat(30);
            println!("{rule}\n{text}\n{rule}");
            Ok(())
        }
    }
}

fn print_harvest_summary(report: &HarvestReport) {
    for category in &report.categories {
        println!("--- Category: {} ---", category.name);
        if let Some(error) = &category.error {
            println!("  search failed: {error}");
        }
        for repo in &category.repositories {
            match &repo.error {
                Some(error) => println!("  {}: skipped ({error})", repo.repository),
                None => println!(
                    "  {}: {} files saved, {} skipped",
                    repo.repository,
                    repo.accepted.len(),
                    repo.skipped.len()
                ),
            }
        }
    }
    println!("Harvest complete. {} files saved.", report.accepted_files());
}
