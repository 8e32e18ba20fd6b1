pub mod completions;
pub mod config;
pub mod me;
pub mod output;
pub mod request;

use clap::{Parser, Subcommand, ValueEnum};

use graph_shaper::Config;

/// Minimal Microsoft Graph style REST client
#[derive(Parser, Debug)]
#[command(name = "graph-shaper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// API host (overrides the config file)
    #[arg(long, env = "GRAPH_API_URL", global = true)]
    pub base_url: Option<String>,

    /// Bearer token sent in the Authorization header
    #[arg(long, env = "GRAPH_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Signed-in user operations
    Me(me::MeCommand),

    /// Send a raw request through the API client
    Request(request::RequestCommand),

    /// Inspect configuration
    Config(config::ConfigCommand),

    /// Generate shell completions
    Completions(completions::CompletionsCommand),
}

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output (best for scripts and agents)
    Json,
    /// Table output (best for humans)
    #[default]
    Table,
    /// Plain output (minimal, for scripting)
    Plain,
}

impl OutputFormat {
    /// Format named in the config file, table if unrecognized.
    pub fn from_config(config: &Config) -> Self {
        OutputFormat::from_str(&config.output.default_format, true).unwrap_or_default()
    }
}

/// Settings resolved from flags, environment and config file.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Config,
    pub format: OutputFormat,
    pub token: Option<String>,
}

impl AppContext {
    pub fn new(cli: &Cli, mut config: Config) -> Self {
        if let Some(base_url) = &cli.base_url {
            config.api.base_url = base_url.clone();
        }
        if !config.output.color {
            colored::control::set_override(false);
        }
        let format = cli
            .format
            .unwrap_or_else(|| OutputFormat::from_config(&config));
        Self {
            config,
            format,
            token: cli.token.clone(),
        }
    }
}
