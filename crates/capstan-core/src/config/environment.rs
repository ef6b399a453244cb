use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::env::EnvSnapshot;
use crate::error::{CapstanError, Result};

/// Adapter name for MySQL connections.
pub const MYSQL_ADAPTER: &str = "mysql";

/// One named database environment.
///
/// Values are strings exactly as they came from the environment; `port` is
/// not parsed until a connection is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Adapter (driver) name.
    #[serde(default = "default_adapter")]
    pub adapter: String,

    /// Database host.
    #[serde(default)]
    pub host: String,

    /// Database name.
    #[serde(default)]
    pub name: String,

    /// Database user.
    #[serde(default)]
    pub user: String,

    /// Database password.
    #[serde(default)]
    pub pass: String,

    /// Database port, unparsed.
    #[serde(default)]
    pub port: String,
}

impl EnvironmentConfig {
    /// Build a MySQL environment from the captured variables.
    pub fn from_env(env: &EnvSnapshot) -> Self {
        Self {
            adapter: default_adapter(),
            host: env.host.clone(),
            name: env.name.clone(),
            user: env.user.clone(),
            pass: env.password.clone(),
            port: env.port.clone(),
        }
    }
}

fn default_adapter() -> String {
    MYSQL_ADAPTER.to_string()
}

/// The `environments` section: runner defaults plus named environments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environments {
    /// Table the runner records applied migrations in.
    #[serde(default = "default_migration_table")]
    pub default_migration_table: String,

    /// Environment used when none is named.
    #[serde(default = "default_database")]
    pub default_database: String,

    /// Named environments.
    #[serde(flatten)]
    pub named: BTreeMap<String, EnvironmentConfig>,
}

impl Default for Environments {
    fn default() -> Self {
        Self {
            default_migration_table: default_migration_table(),
            default_database: default_database(),
            named: BTreeMap::new(),
        }
    }
}

impl Environments {
    /// Look up a named environment.
    pub fn get(&self, name: &str) -> Result<&EnvironmentConfig> {
        self.named
            .get(name)
            .ok_or_else(|| CapstanError::Config(format!("Unknown environment: {}", name)))
    }

    /// The environment named by `default_database`.
    pub fn default_environment(&self) -> Result<&EnvironmentConfig> {
        self.get(&self.default_database)
    }
}

pub(crate) fn default_migration_table() -> String {
    "migration_log".to_string()
}

pub(crate) fn default_database() -> String {
    "dev".to_string()
}
