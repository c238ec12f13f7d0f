//! CLI argument definitions for text2system.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use text2system_nlp::config::DEFAULT_CONFIG_PATH;

/// text2system -- turn user messages into structured commands.
#[derive(Parser)]
#[command(
    name = "text2system",
    version,
    about = "text2system -- natural-language command resolution",
    long_about = "Resolves a free-text message into an intent, the entity class it targets \
                  and the attribute values it mentions, using hosted NLP models."
)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Emit logs as JSON lines instead of compact text.
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve one message and print the command as JSON.
    Resolve {
        /// The user message.
        message: String,
    },

    /// Resolve messages read from stdin, one per line.
    Repl,

    /// Decode a saved NLU response (JSON) against the threshold.
    Decode {
        /// File holding the raw response body.
        file: PathBuf,
    },

    /// Show configuration and credential status.
    Status,
}
