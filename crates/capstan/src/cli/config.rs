use anyhow::Result;
use clap::{Parser, ValueEnum};

use capstan_core::config::RunnerConfig;

use super::GlobalArgs;

/// Print the runner configuration.
#[derive(Parser)]
pub struct ConfigCommand {
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Toml)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Toml,
    Json,
}

impl ConfigCommand {
    pub fn execute(self, global: &GlobalArgs) -> Result<()> {
        let config = global.runner_config()?;
        println!("{}", render(&config, self.format)?);
        Ok(())
    }
}

fn render(config: &RunnerConfig, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Toml => config.to_toml()?,
        OutputFormat::Json => config.to_json()?,
    };
    Ok(rendered)
}
