//! Command-line front end.

pub mod commands;
pub mod repl;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ConfigStore;

#[derive(Parser, Debug)]
#[command(name = "parley", version, about = "Multi-agent chat client for OpenAI-compatible endpoints")]
pub struct Cli {
    /// Config file to use instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive chat
    Chat(ChatArgs),
    /// Show or change the configuration
    Config(ConfigArgs),
    /// List models offered by the endpoint
    Models(ModelsArgs),
    /// Send a short prompt to check the endpoint, key and model
    Check,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Model calls allowed per message
    #[arg(long, default_value_t = crate::runner::DEFAULT_MAX_TURNS)]
    pub max_turns: usize,

    /// Append run traces to this JSON-lines file
    #[arg(long, value_name = "PATH")]
    pub trace_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the configuration with secrets masked
    Show,
    /// Print the config file location
    Path,
    /// Update fields; omitted fields are kept
    Set(SetArgs),
}

#[derive(Args, Debug, Default)]
pub struct SetArgs {
    #[arg(long)]
    pub api_key: Option<String>,
    #[arg(long)]
    pub base_url: Option<String>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub tavily_key: Option<String>,
}

#[derive(Args, Debug)]
pub struct ModelsArgs {
    /// Only models supporting tools and response_format
    #[arg(long)]
    pub tool_capable: bool,
}

impl Cli {
    /// Open the config store selected on the command line.
    pub fn open_config(&self) -> ConfigStore {
        match &self.config {
            Some(path) => ConfigStore::open_with_env(path),
            None => ConfigStore::open_default(),
        }
    }
}
