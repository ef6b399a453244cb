use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tracing::{debug, info};

use capstan_core::descriptor::ConnectionDescriptor;
use capstan_core::error::{CapstanError, Result};

use crate::global;
use crate::schema::SchemaBuilder;

/// Name used when a connection is added without one.
pub const DEFAULT_CONNECTION: &str = "default";

/// Maximum connections per pool.
const POOL_SIZE: u32 = 5;

/// Pool checkout timeout in seconds.
const POOL_TIMEOUT_SECS: u64 = 10;

/// A named connection whose pool is created on first use.
pub struct Connection {
    name: String,
    descriptor: ConnectionDescriptor,
    pool: OnceCell<MySqlPool>,
}

impl Connection {
    fn new(name: String, descriptor: ConnectionDescriptor) -> Self {
        Self {
            name,
            descriptor,
            pool: OnceCell::new(),
        }
    }

    /// Connection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The descriptor this connection was registered with.
    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    /// Get the pool, creating it on first call.
    ///
    /// The descriptor is validated here, not at registration. The pool
    /// itself connects lazily, so the first query is where an unreachable
    /// server shows up. Must be called from within a Tokio runtime.
    pub fn pool(&self) -> Result<&MySqlPool> {
        self.pool.get_or_try_init(|| {
            let options = self.descriptor.connect_options()?;
            debug!(
                "Creating pool for connection '{}': {}",
                self.name,
                self.descriptor.redacted()
            );

            Ok(MySqlPoolOptions::new()
                .max_connections(POOL_SIZE)
                .acquire_timeout(Duration::from_secs(POOL_TIMEOUT_SECS))
                .connect_lazy_with(options))
        })
    }

    /// Whether the pool has been created yet.
    pub fn is_materialized(&self) -> bool {
        self.pool.get().is_some()
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(self.pool()?)
            .await
            .map_err(|e| CapstanError::Database(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Close the pool if it was ever opened.
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
        }
    }
}

/// Registry of named connections.
///
/// Adding connections and booting the model layer happen before the
/// manager is shared; after that it is used through an `Arc`.
#[derive(Default)]
pub struct ConnectionManager {
    connections: HashMap<String, Arc<Connection>>,
    booted: bool,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. `None` registers it as the default one.
    /// Registering an existing name replaces it.
    pub fn add_connection(&mut self, descriptor: ConnectionDescriptor, name: Option<&str>) {
        let name = name.unwrap_or(DEFAULT_CONNECTION).to_string();
        debug!("Registering connection '{}'", name);
        self.connections
            .insert(name.clone(), Arc::new(Connection::new(name, descriptor)));
    }

    /// Enable the model layer for this manager.
    pub fn boot_models(&mut self) {
        self.booted = true;
    }

    /// Whether `boot_models` has been called.
    pub fn is_booted(&self) -> bool {
        self.booted
    }

    /// Make this manager the process-wide default, replacing any previous one.
    pub fn set_as_global(self: &Arc<Self>) {
        global::set_global(Arc::clone(self));
    }

    /// Look up a connection by name.
    pub fn connection(&self, name: &str) -> Result<Arc<Connection>> {
        self.connections
            .get(name)
            .cloned()
            .ok_or_else(|| CapstanError::Config(format!("Unknown connection: {}", name)))
    }

    /// The default connection.
    pub fn default_connection(&self) -> Result<Arc<Connection>> {
        self.connection(DEFAULT_CONNECTION)
    }

    /// Schema builder for the default connection.
    pub fn schema(&self) -> Result<SchemaBuilder> {
        self.schema_for(DEFAULT_CONNECTION)
    }

    /// Schema builder for a named connection.
    pub fn schema_for(&self, name: &str) -> Result<SchemaBuilder> {
        Ok(SchemaBuilder::new(self.connection(name)?))
    }

    /// Names of all registered connections, sorted.
    pub fn connection_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.connections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Close every pool that was opened.
    pub async fn close(&self) {
        for connection in self.connections.values() {
            connection.close().await;
        }
        info!("Closed {} connection(s)", self.connections.len());
    }
}
