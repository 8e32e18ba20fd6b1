mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{AppContext, Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "graph_shaper=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = graph_shaper::Config::load()?;
    let ctx = AppContext::new(&cli, config);

    // Execute command
    let result = match cli.command {
        Commands::Me(cmd) => cli::me::execute(cmd, &ctx).await,
        Commands::Request(cmd) => cli::request::execute(cmd, &ctx).await,
        Commands::Config(cmd) => cli::config::execute(cmd, &ctx),
        Commands::Completions(cmd) => cli::completions::execute(cmd),
    };

    if let Err(e) = &result {
        cli::output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
