//! Connection bootstrap for migrations.
//!
//! `MigrationContext::init` is what a runner calls before `up` or `down`.
//! It never opens a connection; the first schema operation does.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use capstan_core::config::EnvironmentConfig;
use capstan_core::descriptor::ConnectionDescriptor;
use capstan_core::env::{load_env_file, EnvSnapshot};
use capstan_core::error::Result;

use crate::manager::{Connection, ConnectionManager};
use crate::schema::SchemaBuilder;

/// What every migration and seeder receives.
#[derive(Clone)]
pub struct MigrationContext {
    /// Manager holding the configured connection. Also installed globally.
    pub manager: Arc<ConnectionManager>,

    /// Schema builder bound to the configured connection.
    pub schema: SchemaBuilder,
}

impl MigrationContext {
    /// Load `<env_dir>/.env`, read the database variables and bootstrap.
    pub fn init(env_dir: impl AsRef<Path>) -> Result<Self> {
        load_env_file(env_dir)?;
        Self::from_env(&EnvSnapshot::from_process())
    }

    /// Bootstrap from already captured variables.
    pub fn from_env(env: &EnvSnapshot) -> Result<Self> {
        Self::from_descriptor(ConnectionDescriptor::from_env(env))
    }

    /// Bootstrap from a runner environment entry.
    pub fn for_environment(config: &EnvironmentConfig) -> Result<Self> {
        Self::from_descriptor(ConnectionDescriptor::from_environment(config)?)
    }

    /// Register the descriptor, boot models, go global, take a schema handle.
    pub fn from_descriptor(descriptor: ConnectionDescriptor) -> Result<Self> {
        info!("Bootstrapping connection {}", descriptor.redacted());

        let mut manager = ConnectionManager::new();
        manager.add_connection(descriptor, None);
        manager.boot_models();

        let manager = Arc::new(manager);
        manager.set_as_global();

        let schema = manager.schema()?;
        Ok(Self { manager, schema })
    }

    /// The connection the schema builder is bound to.
    pub fn connection(&self) -> &Arc<Connection> {
        self.schema.connection()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::global::{clear_global, global, test_guard, test_guard_async};
    use capstan_core::error::CapstanError;
    use sea_query::{Alias, ColumnDef, Table};
    use tempfile::TempDir;

    fn env(host: &str) -> EnvSnapshot {
        EnvSnapshot {
            host: host.into(),
            name: "test".into(),
            user: "root".into(),
            password: "secret".into(),
            port: "3306".into(),
        }
    }

    #[test]
    fn test_from_env_binds_schema_to_descriptor() {
        let _guard = test_guard();

        let ctx = MigrationContext::from_env(&env("localhost")).unwrap();
        let descriptor = ctx.connection().descriptor();

        assert_eq!(descriptor, &ConnectionDescriptor::from_env(&env("localhost")));
        assert_eq!(descriptor.charset, "utf8");
        assert_eq!(descriptor.collation, "utf8_unicode_ci");
        assert!(ctx.manager.is_booted());
        assert!(!ctx.connection().is_materialized());

        clear_global();
    }

    #[test]
    fn test_second_init_overwrites_global() {
        let _guard = test_guard();

        let first = MigrationContext::from_env(&env("first.db")).unwrap();
        let second = MigrationContext::from_env(&env("second.db")).unwrap();

        let current = global().unwrap();
        assert!(Arc::ptr_eq(&current, &second.manager));
        assert!(!Arc::ptr_eq(&current, &first.manager));
        assert_eq!(
            current.default_connection().unwrap().descriptor().host,
            "second.db"
        );

        clear_global();
    }

    #[test]
    fn test_init_without_env_file() {
        let _guard = test_guard();
        let dir = TempDir::new().unwrap();

        let ctx = MigrationContext::init(dir.path()).unwrap();
        assert!(global().is_some());
        assert_eq!(ctx.connection().descriptor().driver, "mysql");

        clear_global();
    }

    #[tokio::test]
    async fn test_empty_host_defers_failure_to_schema_operation() {
        let _guard = test_guard_async().await;

        let ctx = MigrationContext::from_env(&env("")).unwrap();

        let table = Table::create()
            .table(Alias::new("posts"))
            .col(ColumnDef::new(Alias::new("id")).integer().not_null())
            .to_owned();
        let err = ctx.schema.create_table(&table).await.unwrap_err();
        assert!(matches!(err, CapstanError::Config(_)));

        clear_global();
    }

    #[tokio::test]
    async fn test_init_with_empty_host_in_env_file() {
        let _guard = test_guard_async().await;
        std::env::remove_var("DB_HOST");
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".env"), "DB_HOST=\n").unwrap();

        let ctx = MigrationContext::init(dir.path()).unwrap();
        assert_eq!(ctx.connection().descriptor().host, "");
        assert!(!ctx.connection().is_materialized());

        let table = Table::create()
            .table(Alias::new("posts"))
            .col(ColumnDef::new(Alias::new("id")).integer().not_null())
            .to_owned();
        let err = ctx.schema.create_table(&table).await.unwrap_err();
        assert!(matches!(err, CapstanError::Config(_)));

        std::env::remove_var("DB_HOST");
        clear_global();
    }

    #[test]
    fn test_for_environment_rejects_unknown_adapter() {
        let _guard = test_guard();
        clear_global();

        let config = EnvironmentConfig {
            adapter: "sqlite".into(),
            ..EnvironmentConfig::from_env(&env("localhost"))
        };
        assert!(MigrationContext::for_environment(&config).is_err());
        assert!(global().is_none());
    }
}
