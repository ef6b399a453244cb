use anyhow::Result;
use clap::Parser;
use console::style;
use tracing::info;

use capstan_runtime::MigrationContext;

use super::GlobalArgs;

/// Bootstrap a connection and check the database is reachable.
#[derive(Parser)]
pub struct CheckCommand {
    /// Environment to check (defaults to environments.default_database).
    #[arg(short, long)]
    pub environment: Option<String>,
}

impl CheckCommand {
    pub async fn execute(self, global: &GlobalArgs) -> Result<()> {
        let config = global.runner_config()?;
        let name = self
            .environment
            .unwrap_or_else(|| config.environments.default_database.clone());
        let environment = config.environment(&name)?;

        let ctx = MigrationContext::for_environment(environment)?;
        let descriptor = ctx.connection().descriptor();

        println!();
        println!(
            "  {} Environment {}",
            style("→").dim(),
            style(&name).bold().cyan()
        );
        println!("  {} {}", style("→").dim(), descriptor.redacted());

        info!("Checking connectivity for environment {}", name);
        let result = ctx.connection().health_check().await;
        ctx.manager.close().await;
        result?;

        println!("  {} Database reachable", style("✓").green());
        println!();
        Ok(())
    }
}
