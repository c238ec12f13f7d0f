//! CLI entry point for text2system.
//!
//! This binary provides the `text2system` command with subcommands for
//! resolving messages, decoding NLU responses and checking configuration.

mod cli;
mod helpers;
mod repl;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use text2system_nlp::{DecodedMessage, EngineConfig, NluResponse, PipelineKind};

use crate::cli::{Cli, Commands};
use crate::helpers::{build_engine, init_tracing, load_config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Resolve { .. } | Commands::Decode { .. } | Commands::Status => "warn",
        Commands::Repl => "info",
    };
    init_tracing(default_level, cli.json_logs);

    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Resolve { message } => cmd_resolve(&config, &message).await,
        Commands::Repl => repl::cmd_repl(build_engine(&config)?).await,
        Commands::Decode { file } => cmd_decode(&config, &file),
        Commands::Status => cmd_status(&config, &cli.config),
    }
}

// ---------------------------------------------------------------------------
// Subcommand: resolve
// ---------------------------------------------------------------------------

async fn cmd_resolve(config: &EngineConfig, message: &str) -> Result<()> {
    let mut engine = build_engine(config)?;
    let command = engine
        .resolve_command(message)
        .await
        .with_context(|| format!("failed to resolve `{message}`"))?;

    println!("{}", serde_json::to_string_pretty(&command)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: decode
// ---------------------------------------------------------------------------

fn cmd_decode(config: &EngineConfig, file: &Path) -> Result<()> {
    let body = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let response = NluResponse::from_json(&body).context("not an NLU response")?;
    let decoded = DecodedMessage::decode(&response, config.engine.threshold)
        .context("failed to decode NLU response")?;
    info!(entities = decoded.entities().len(), "response decoded");

    println!();
    match decoded.intent() {
        Some(intent) => println!("  Intent:   {intent}"),
        None => println!("  Intent:   (none above {})", config.engine.threshold),
    }
    for (entity_type, entities) in decoded.entities_grouped() {
        for entity in entities {
            match &entity.role {
                Some(role) => println!("  {entity_type:<9} {} [{role}] @{}", entity.body, entity.start),
                None => println!("  {entity_type:<9} {} @{}", entity.body, entity.start),
            }
        }
    }
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: status
// ---------------------------------------------------------------------------

fn cmd_status(config: &EngineConfig, config_path: &Path) -> Result<()> {
    println!();
    println!("  text2system Status");
    println!("  ==================");
    println!();

    if config_path.exists() {
        println!("  Config:           OK ({})", config_path.display());
    } else {
        println!("  Config:           MISSING, using defaults ({})", config_path.display());
    }
    println!("  Threshold:        {}", config.engine.threshold);
    println!("  Inference API:    {}", config.engine.hf_base_url);

    let set = |value: &Option<String>| if value.is_some() { "CONFIGURED" } else { "NOT SET" };
    println!("  HF token:         {}", set(&config.engine.hf_api_token));
    println!("  Wit.ai key:       {}", set(&config.engine.wit_access_key));

    println!();
    println!("  Models:");
    for kind in PipelineKind::ALL {
        println!("    {:<26} {}", kind.as_str(), config.models.for_kind(kind));
    }

    println!();
    println!("  Domain classes:");
    if config.domain.classes.is_empty() {
        println!("    (none)");
    }
    for class in &config.domain.classes {
        println!("    {} [{}]", class.name, class.attributes.join(", "));
        if !class.synonyms.is_empty() {
            println!("      synonyms: {}", class.synonyms.join(", "));
        }
    }
    println!();

    Ok(())
}
