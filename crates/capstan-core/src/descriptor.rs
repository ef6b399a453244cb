//! Connection descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlConnectOptions;

use crate::config::{EnvironmentConfig, MYSQL_ADAPTER};
use crate::env::EnvSnapshot;
use crate::error::{CapstanError, Result};

/// Character set every connection is opened with.
pub const CHARSET: &str = "utf8";

/// Collation every connection is opened with.
pub const COLLATION: &str = "utf8_unicode_ci";

/// Everything needed to open a database connection.
///
/// Built once from the environment and never validated on construction.
/// `port` is kept as the string it was read as.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    pub driver: String,
    pub host: String,
    pub port: String,
    pub database: String,
    pub username: String,
    pub password: String,
    pub charset: String,
    pub collation: String,
}

impl ConnectionDescriptor {
    /// MySQL descriptor from captured variables.
    pub fn from_env(env: &EnvSnapshot) -> Self {
        Self {
            driver: MYSQL_ADAPTER.to_string(),
            host: env.host.clone(),
            port: env.port.clone(),
            database: env.name.clone(),
            username: env.user.clone(),
            password: env.password.clone(),
            charset: CHARSET.to_string(),
            collation: COLLATION.to_string(),
        }
    }

    /// Descriptor for a runner environment entry.
    pub fn from_environment(config: &EnvironmentConfig) -> Result<Self> {
        if config.adapter != MYSQL_ADAPTER {
            return Err(CapstanError::Config(format!(
                "Unsupported adapter '{}', only '{}' is available",
                config.adapter, MYSQL_ADAPTER
            )));
        }

        Ok(Self {
            driver: MYSQL_ADAPTER.to_string(),
            host: config.host.clone(),
            port: config.port.clone(),
            database: config.name.clone(),
            username: config.user.clone(),
            password: config.pass.clone(),
            charset: CHARSET.to_string(),
            collation: COLLATION.to_string(),
        })
    }

    /// Parse the port. Called only when a connection is actually opened.
    pub fn parsed_port(&self) -> Result<u16> {
        self.port
            .trim()
            .parse::<u16>()
            .map_err(|e| CapstanError::InvalidPort {
                value: self.port.clone(),
                reason: e.to_string(),
            })
    }

    /// Convert into driver options.
    ///
    /// This is the first point where the descriptor is checked: an empty
    /// host or an unparseable port fails here.
    pub fn connect_options(&self) -> Result<MySqlConnectOptions> {
        if self.host.trim().is_empty() {
            return Err(CapstanError::Config(
                "Database host is empty (is DB_HOST set?)".to_string(),
            ));
        }

        let mut options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.parsed_port()?)
            .username(&self.username)
            .charset(&self.charset)
            .collation(&self.collation);

        if !self.password.is_empty() {
            options = options.password(&self.password);
        }
        if !self.database.is_empty() {
            options = options.database(&self.database);
        }

        Ok(options)
    }

    /// Display form with the password masked.
    pub fn redacted(&self) -> String {
        let password = if self.password.is_empty() { "" } else { "****" };
        format!(
            "{}://{}:{}@{}:{}/{} ({}, {})",
            self.driver,
            self.username,
            password,
            self.host,
            self.port,
            self.database,
            self.charset,
            self.collation
        )
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"****")
            .field("charset", &self.charset)
            .field("collation", &self.collation)
            .finish()
    }
}
