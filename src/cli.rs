//! Command-line interface definition for Ragbot
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot prompts, and listing
//! saved sessions and configured engines.

use crate::config::{Creativity, ParamOverrides};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Ragbot - conversational assistant with custom instructions and curated datasets
#[derive(Parser, Debug, Clone)]
#[command(name = "ragbot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the engine catalog
    #[arg(short, long, default_value = "config/engines.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Application data directory (sessions are stored under it)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Ragbot
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive conversation
    Chat {
        #[command(flatten)]
        generation: GenerationArgs,

        #[command(flatten)]
        material: MaterialArgs,

        /// Continue a saved session (instructions and datasets are not re-applied)
        #[arg(short, long)]
        load: Option<String>,
    },

    /// Send one prompt and print the reply
    Ask {
        #[command(flatten)]
        generation: GenerationArgs,

        #[command(flatten)]
        material: MaterialArgs,

        #[command(flatten)]
        source: PromptSource,
    },

    /// List saved sessions
    Sessions,

    /// List configured engines and models
    Engines {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Engine and generation parameter overrides
#[derive(Args, Debug, Clone, Default)]
pub struct GenerationArgs {
    /// Engine to use (defaults to the catalog default)
    #[arg(short, long)]
    pub engine: Option<String>,

    /// Model to use (defaults to the engine's default model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Sampling temperature between 0.0 and 1.0
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Named temperature preset
    #[arg(long, value_enum)]
    pub creativity: Option<Creativity>,

    /// Maximum tokens in the reply
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Wait for the whole reply instead of streaming it
    #[arg(long)]
    pub no_stream: bool,
}

impl GenerationArgs {
    /// Per-request overrides for parameter resolution
    pub fn overrides(&self) -> ParamOverrides {
        ParamOverrides {
            model: self.model.clone(),
            temperature: self.temperature,
            creativity: self.creativity,
            max_tokens: self.max_tokens,
            stream: if self.no_stream { Some(false) } else { None },
        }
    }
}

/// Instruction and dataset sources
#[derive(Args, Debug, Clone, Default)]
pub struct MaterialArgs {
    /// Instruction files or folders
    #[arg(short, long = "instructions", num_args = 1..)]
    pub instructions: Vec<String>,

    /// Curated dataset files or folders
    #[arg(short, long = "datasets", num_args = 1..)]
    pub datasets: Vec<String>,

    /// Catalog profile whose paths are added to the explicit ones
    #[arg(long)]
    pub profile: Option<String>,

    /// Ignore all instruction and dataset material
    #[arg(long)]
    pub no_instructions: bool,
}

/// Where a one-shot prompt comes from
#[derive(Args, Debug, Clone, Default)]
#[group(required = true, multiple = false)]
pub struct PromptSource {
    /// Prompt text
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Read the prompt from a file
    #[arg(short = 'f', long)]
    pub prompt_file: Option<PathBuf>,

    /// Read the prompt from standard input
    #[arg(long)]
    pub stdin: bool,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/engines.yaml".to_string()),
            verbose: false,
            data_dir: None,
            command: Commands::Sessions,
        }
    }
}
