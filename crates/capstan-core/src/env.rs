//! Environment loading.
//!
//! Connection parameters come from five variables, read from the process
//! environment after an optional `.env` file has been merged into it.

use std::path::Path;

use tracing::debug;

use crate::error::Result;

pub const DB_HOST: &str = "DB_HOST";
pub const DB_NAME: &str = "DB_NAME";
pub const DB_USER: &str = "DB_USER";
pub const DB_PASSWORD: &str = "DB_PASSWORD";
pub const DB_PORT: &str = "DB_PORT";

/// Name of the env file looked up inside the env directory.
pub const ENV_FILE: &str = ".env";

/// Load `<dir>/.env` into the process environment.
///
/// Variables already present in the process are never overridden, so
/// loading the same file twice leaves the environment unchanged. A missing
/// file is not an error.
pub fn load_env_file(dir: impl AsRef<Path>) -> Result<()> {
    let path = dir.as_ref().join(ENV_FILE);

    match dotenvy::from_path(&path) {
        Ok(()) => {
            debug!("Loaded environment from {}", path.display());
            Ok(())
        }
        Err(e) if e.not_found() => {
            debug!("No env file at {}, using process environment", path.display());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// The database variables, captured once.
///
/// Missing variables are empty strings. Nothing is validated here; a bad
/// value only fails when a connection is actually opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    pub host: String,
    pub name: String,
    pub user: String,
    pub password: String,
    pub port: String,
}

impl EnvSnapshot {
    /// Read the variables from the process environment.
    pub fn from_process() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the variables through an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).unwrap_or_default();

        Self {
            host: get(DB_HOST),
            name: get(DB_NAME),
            user: get(DB_USER),
            password: get(DB_PASSWORD),
            port: get(DB_PORT),
        }
    }

    /// Merge `<dir>/.env` into the process environment, then snapshot it.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        load_env_file(dir)?;
        Ok(Self::from_process())
    }
}
