//! Lifecycle contracts a migration runner drives.
//!
//! A runner bootstraps a `MigrationContext` and then calls `up` or `down`
//! with it. Ordering and bookkeeping of applied migrations belong to the
//! runner.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use tracing::{error, info};

use capstan_core::error::{CapstanError, Result};

use crate::bootstrap::MigrationContext;

/// A versioned schema change.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Unique name, conventionally `<timestamp>_<snake_name>`.
    fn name(&self) -> &str;

    /// Apply the change.
    async fn up(&self, ctx: &MigrationContext) -> Result<()>;

    /// Revert the change. Irreversible migrations keep the default.
    async fn down(&self, _ctx: &MigrationContext) -> Result<()> {
        Ok(())
    }
}

/// Populates tables with data.
#[async_trait]
pub trait Seeder: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, ctx: &MigrationContext) -> Result<()>;
}

/// Which lifecycle hook to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Call one hook of `migration` with an existing context.
///
/// Failures are reported as `CapstanError::Migration` carrying the name.
pub async fn apply(
    migration: &dyn Migration,
    ctx: &MigrationContext,
    direction: Direction,
) -> Result<()> {
    info!("Migrating {} ({})", migration.name(), direction);

    let result = match direction {
        Direction::Up => migration.up(ctx).await,
        Direction::Down => migration.down(ctx).await,
    };

    result.map_err(|e| {
        error!("Migration {} failed: {}", migration.name(), e);
        CapstanError::Migration {
            name: migration.name().to_string(),
            reason: e.to_string(),
        }
    })
}

/// Bootstrap from `<env_dir>/.env` and then call one hook.
///
/// The context is always initialized before the hook runs.
pub async fn init_and_apply(
    env_dir: impl AsRef<Path>,
    migration: &dyn Migration,
    direction: Direction,
) -> Result<MigrationContext> {
    let ctx = MigrationContext::init(env_dir)?;
    apply(migration, &ctx, direction).await?;
    Ok(ctx)
}

/// Run a seeder, reporting failures like migrations.
pub async fn seed(seeder: &dyn Seeder, ctx: &MigrationContext) -> Result<()> {
    info!("Seeding {}", seeder.name());

    seeder.run(ctx).await.map_err(|e| CapstanError::Migration {
        name: seeder.name().to_string(),
        reason: e.to_string(),
    })
}
