mod environment;

pub use environment::{EnvironmentConfig, Environments, MYSQL_ADAPTER};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::env::EnvSnapshot;
use crate::error::{CapstanError, Result};

/// Type migrations receive their connection through.
pub const MIGRATION_BASE: &str = "capstan_runtime::MigrationContext";

/// Configuration handed to the migration runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Fully qualified name of the migration context type.
    #[serde(default = "default_migration_base")]
    pub migration_base_class: String,

    /// Script locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Database environments.
    #[serde(default)]
    pub environments: Environments,
}

impl RunnerConfig {
    /// Build the configuration from captured variables.
    ///
    /// Produces a single `dev` environment. Nothing is validated: empty
    /// variables end up as empty strings in the configuration.
    pub fn from_env(env: &EnvSnapshot) -> Self {
        let mut environments = Environments::default();
        environments
            .named
            .insert(environments.default_database.clone(), EnvironmentConfig::from_env(env));

        Self {
            migration_base_class: default_migration_base(),
            paths: PathsConfig::default(),
            environments,
        }
    }

    /// Load `<dir>/.env` into the process environment and build from it.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let env = EnvSnapshot::load(dir)?;
        Ok(Self::from_env(&env))
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| CapstanError::Config(format!("Failed to read config file: {}", e)))?;

        debug!("Parsing runner config from {}", path.as_ref().display());
        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let content = substitute_env_vars(content);

        toml::from_str(&content)
            .map_err(|e| CapstanError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Render the configuration as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Look up a named environment.
    pub fn environment(&self, name: &str) -> Result<&EnvironmentConfig> {
        self.environments.get(name)
    }

    /// The environment named by `environments.default_database`.
    pub fn default_environment(&self) -> Result<&EnvironmentConfig> {
        self.environments.default_environment()
    }
}

fn default_migration_base() -> String {
    MIGRATION_BASE.to_string()
}

/// Where migration and seed sources live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Migration sources.
    #[serde(default = "default_migrations_path")]
    pub migrations: String,

    /// Seed sources.
    #[serde(default = "default_seeds_path")]
    pub seeds: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            migrations: default_migrations_path(),
            seeds: default_seeds_path(),
        }
    }
}

fn default_migrations_path() -> String {
    "src/migrations".to_string()
}

fn default_seeds_path() -> String {
    "src/seeds".to_string()
}

static ENV_VAR_PATTERN: Lazy<regex_lite::Regex> = Lazy::new(|| {
    regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is valid")
});

/// Substitute environment variables in the format ${VAR_NAME}.
///
/// Unset variables are left as written.
fn substitute_env_vars(content: &str) -> String {
    let mut result = content.to_string();

    for cap in ENV_VAR_PATTERN.captures_iter(content) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}
