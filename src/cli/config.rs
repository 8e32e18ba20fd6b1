use anyhow::Result;
use clap::{Args, Subcommand};

use graph_shaper::Config;

use super::output::print_single;
use super::{AppContext, OutputFormat};

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Show the effective configuration
    Show,

    /// Print the config file location
    Path,
}

pub fn execute(cmd: ConfigCommand, ctx: &AppContext) -> Result<()> {
    match cmd.command {
        ConfigSubcommand::Show => show(&ctx.config, ctx.format),
        ConfigSubcommand::Path => {
            println!("{}", Config::config_path()?.display());
            Ok(())
        }
    }
}

fn show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_single(config, format),
        OutputFormat::Table | OutputFormat::Plain => {
            print!("{}", toml::to_string_pretty(config)?);
            Ok(())
        }
    }
}
