//! Shared setup for the subcommands: logging, configuration and the engine.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use text2system_adapters::{HfPipelineFactory, WitClient};
use text2system_nlp::{CommandEngine, EngineConfig};

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber with the given default log level.
///
/// Logs go to stderr so that command output on stdout stays parseable.
pub fn init_tracing(default_level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Load `.env`, the config file and the environment overrides, in that order.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if let Ok(dotenv) = dotenvy::dotenv() {
        info!(path = %dotenv.display(), "loaded .env");
    }

    let config = EngineConfig::load(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?
        .apply_env()
        .context("invalid environment override")?;

    info!(
        path = %path.display(),
        threshold = config.engine.threshold,
        classes = config.domain.classes.len(),
        "configuration loaded"
    );
    Ok(config)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Build a command engine backed by the hosted inference and NLU services.
pub fn build_engine(config: &EngineConfig) -> Result<CommandEngine> {
    let factory = HfPipelineFactory::from_config(config)
        .context("failed to create inference client")?;
    if !factory.client().has_token() {
        warn!("HF_API_TOKEN not set, inference requests are anonymous");
    }

    let mut engine = CommandEngine::from_config(config, Arc::new(factory));

    match config.engine.wit_access_key.as_deref() {
        Some(key) => {
            let wit = WitClient::new(key).context("failed to create Wit.ai client")?;
            engine = engine.with_nlu(Arc::new(wit));
            info!("NLU service ready");
        }
        None => info!("WIT_ACCESS_KEY not set, NLU checks disabled"),
    }

    Ok(engine)
}
