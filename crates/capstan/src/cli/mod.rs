mod check;
mod config;
mod create;

pub use check::CheckCommand;
pub use config::ConfigCommand;
pub use create::CreateCommand;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use capstan_core::config::RunnerConfig;
use capstan_core::env::load_env_file;

/// capstan - MySQL connections and schema handles for migrations
#[derive(Parser)]
#[command(name = "capstan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Directory containing the .env file.
    #[arg(long, default_value = ".", global = true)]
    pub env_dir: String,

    /// Runner configuration file (TOML). Built from the environment when omitted.
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    /// Load the runner configuration these options point at.
    ///
    /// The env file is always loaded first so `${VAR}` references in a
    /// config file can use it.
    pub fn runner_config(&self) -> Result<RunnerConfig> {
        match &self.config {
            Some(path) => {
                load_env_file(&self.env_dir)?;
                debug!("Loading runner config from {}", path);
                Ok(RunnerConfig::from_file(path)?)
            }
            None => Ok(RunnerConfig::load(&self.env_dir)?),
        }
    }
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Print the runner configuration.
    Config(ConfigCommand),

    /// Bootstrap a connection and check the database is reachable.
    Check(CheckCommand),

    /// Create a new migration file.
    Create(CreateCommand),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        init_tracing(self.global.verbose);

        match self.command {
            Commands::Config(cmd) => cmd.execute(&self.global),
            Commands::Check(cmd) => cmd.execute(&self.global).await,
            Commands::Create(cmd) => cmd.execute(&self.global),
        }
    }
}

fn init_tracing(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()))
        .with_writer(std::io::stderr)
        .init();
}
