//! Connection manager, schema builder and migration bootstrap for capstan.
//!
//! Pools connect lazily: nothing here opens a connection until a statement
//! runs.

pub mod bootstrap;
pub mod global;
pub mod manager;
pub mod migration;
pub mod model;
pub mod schema;

pub use bootstrap::MigrationContext;
pub use global::{clear_global, global, set_global};
pub use manager::{Connection, ConnectionManager, DEFAULT_CONNECTION};
pub use migration::{apply, init_and_apply, seed, Direction, Migration, Seeder};
pub use model::Model;
pub use schema::SchemaBuilder;

/// Re-exported so migration crates need no direct dependency.
pub use async_trait::async_trait;
pub use sea_query;
