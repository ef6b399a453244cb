//! capstan: environment-driven MySQL connections and schema handles for
//! migrations.
//!
//! Migrations implement [`Migration`] and receive a [`MigrationContext`]
//! whose `schema` field issues DDL against the configured connection.

pub use capstan_core;
pub use capstan_runtime;

pub use capstan_core::{
    CapstanError, ConnectionDescriptor, EnvSnapshot, EnvironmentConfig, Result, RunnerConfig,
};
pub use capstan_runtime::{
    ConnectionManager, Direction, Migration, MigrationContext, Model, SchemaBuilder, Seeder,
};

/// Everything a migration file needs.
pub mod prelude {
    pub use capstan_runtime::async_trait;

    pub use capstan_core::{CapstanError, Result};
    pub use capstan_runtime::sea_query::{
        Alias, ColumnDef, Expr, ForeignKey, ForeignKeyAction, Iden, Index, Table,
    };
    pub use capstan_runtime::{Migration, MigrationContext, Seeder};
}
