//! Minimal model layer over the global default connection.
//!
//! Available once a manager has been booted with `boot_models` and
//! installed with `set_as_global`. Seeders use it to read back rows.

use std::sync::Arc;

use sea_query::{Alias, Asterisk, Expr, MysqlQueryBuilder, Query, QueryStatementWriter};
use sqlx::mysql::MySqlRow;
use sqlx::FromRow;

use capstan_core::error::{CapstanError, Result};

use crate::global;
use crate::manager::ConnectionManager;

/// A row type stored in one table.
pub trait Model: for<'r> FromRow<'r, MySqlRow> + Send + Unpin + 'static {
    /// Table name.
    const TABLE: &'static str;

    /// Primary key column.
    const PRIMARY_KEY: &'static str = "id";
}

/// Find a row by primary key.
pub async fn find<M: Model>(id: i64) -> Result<Option<M>> {
    let manager = resolve()?;
    let pool = manager.default_connection()?.pool()?.clone();

    sqlx::query_as::<_, M>(&find_sql::<M>(id))
        .fetch_optional(&pool)
        .await
        .map_err(|e| CapstanError::Database(format!("Failed to load {}: {}", M::TABLE, e)))
}

/// Load every row of the model's table.
pub async fn all<M: Model>() -> Result<Vec<M>> {
    let manager = resolve()?;
    let pool = manager.default_connection()?.pool()?.clone();

    sqlx::query_as::<_, M>(&all_sql::<M>())
        .fetch_all(&pool)
        .await
        .map_err(|e| CapstanError::Database(format!("Failed to load {}: {}", M::TABLE, e)))
}

fn find_sql<M: Model>(id: i64) -> String {
    Query::select()
        .column(Asterisk)
        .from(Alias::new(M::TABLE))
        .and_where(Expr::col(Alias::new(M::PRIMARY_KEY)).eq(id))
        .to_string(MysqlQueryBuilder)
}

fn all_sql<M: Model>() -> String {
    Query::select()
        .column(Asterisk)
        .from(Alias::new(M::TABLE))
        .to_string(MysqlQueryBuilder)
}

/// The booted global manager.
fn resolve() -> Result<Arc<ConnectionManager>> {
    let manager = global::global()
        .ok_or_else(|| CapstanError::NotBooted("no global connection manager".to_string()))?;

    if !manager.is_booted() {
        return Err(CapstanError::NotBooted(
            "global connection manager was not booted".to_string(),
        ));
    }

    Ok(manager)
}
