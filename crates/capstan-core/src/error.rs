use thiserror::Error;

/// Core error type for capstan operations.
#[derive(Error, Debug)]
pub enum CapstanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment file error: {0}")]
    Env(String),

    #[error("Invalid port {value:?}: {reason}")]
    InvalidPort { value: String, reason: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Model layer not booted: {0}")]
    NotBooted(String),

    #[error("Migration '{name}' failed: {reason}")]
    Migration { name: String, reason: String },
}

impl From<serde_json::Error> for CapstanError {
    fn from(e: serde_json::Error) -> Self {
        CapstanError::Serialization(e.to_string())
    }
}

impl From<toml::ser::Error> for CapstanError {
    fn from(e: toml::ser::Error) -> Self {
        CapstanError::Serialization(e.to_string())
    }
}

impl From<dotenvy::Error> for CapstanError {
    fn from(e: dotenvy::Error) -> Self {
        CapstanError::Env(e.to_string())
    }
}

/// Result type alias using CapstanError.
pub type Result<T> = std::result::Result<T, CapstanError>;
