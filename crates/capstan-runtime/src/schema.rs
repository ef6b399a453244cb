//! Schema builder bound to one connection.
//!
//! Statements are built with `sea-query` and rendered for MySQL. Rendering
//! never touches the database; executing does, and that is where a bad
//! descriptor or an unreachable server is reported.

use std::sync::Arc;

use sea_query::{
    ForeignKeyCreateStatement, ForeignKeyDropStatement, IndexCreateStatement, IndexDropStatement,
    MysqlQueryBuilder, SchemaStatementBuilder, TableAlterStatement, TableCreateStatement,
    TableDropStatement, TableRenameStatement, TableTruncateStatement,
};
use tracing::{debug, info};

use capstan_core::error::{CapstanError, Result};

use crate::manager::Connection;

/// Issues DDL against the connection it was obtained for.
#[derive(Clone)]
pub struct SchemaBuilder {
    connection: Arc<Connection>,
}

impl SchemaBuilder {
    pub(crate) fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }

    /// The connection statements run on.
    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Render a CREATE TABLE with the connection's charset and collation.
    pub fn render_create_table(&self, stmt: &TableCreateStatement) -> String {
        let descriptor = self.connection.descriptor();
        let mut stmt = stmt.clone();
        stmt.character_set(descriptor.charset.as_str())
            .collate(descriptor.collation.as_str());
        stmt.to_string(MysqlQueryBuilder)
    }

    pub fn render_alter_table(&self, stmt: &TableAlterStatement) -> String {
        stmt.to_string(MysqlQueryBuilder)
    }

    pub fn render_drop_table(&self, stmt: &TableDropStatement) -> String {
        stmt.to_string(MysqlQueryBuilder)
    }

    pub fn render_rename_table(&self, stmt: &TableRenameStatement) -> String {
        stmt.to_string(MysqlQueryBuilder)
    }

    pub fn render_truncate_table(&self, stmt: &TableTruncateStatement) -> String {
        stmt.to_string(MysqlQueryBuilder)
    }

    pub fn render_create_index(&self, stmt: &IndexCreateStatement) -> String {
        stmt.to_string(MysqlQueryBuilder)
    }

    pub fn render_drop_index(&self, stmt: &IndexDropStatement) -> String {
        stmt.to_string(MysqlQueryBuilder)
    }

    pub fn render_create_foreign_key(&self, stmt: &ForeignKeyCreateStatement) -> String {
        stmt.to_string(MysqlQueryBuilder)
    }

    pub fn render_drop_foreign_key(&self, stmt: &ForeignKeyDropStatement) -> String {
        stmt.to_string(MysqlQueryBuilder)
    }

    /// Create a table.
    pub async fn create_table(&self, stmt: &TableCreateStatement) -> Result<()> {
        self.execute_raw(&self.render_create_table(stmt)).await
    }

    /// Alter a table (add, modify, rename or drop columns).
    pub async fn alter_table(&self, stmt: &TableAlterStatement) -> Result<()> {
        self.execute_raw(&self.render_alter_table(stmt)).await
    }

    /// Drop one or more tables.
    pub async fn drop_table(&self, stmt: &TableDropStatement) -> Result<()> {
        self.execute_raw(&self.render_drop_table(stmt)).await
    }

    /// Rename a table.
    pub async fn rename_table(&self, stmt: &TableRenameStatement) -> Result<()> {
        self.execute_raw(&self.render_rename_table(stmt)).await
    }

    /// Remove all rows from a table.
    pub async fn truncate_table(&self, stmt: &TableTruncateStatement) -> Result<()> {
        self.execute_raw(&self.render_truncate_table(stmt)).await
    }

    pub async fn create_index(&self, stmt: &IndexCreateStatement) -> Result<()> {
        self.execute_raw(&self.render_create_index(stmt)).await
    }

    pub async fn drop_index(&self, stmt: &IndexDropStatement) -> Result<()> {
        self.execute_raw(&self.render_drop_index(stmt)).await
    }

    pub async fn create_foreign_key(&self, stmt: &ForeignKeyCreateStatement) -> Result<()> {
        self.execute_raw(&self.render_create_foreign_key(stmt)).await
    }

    pub async fn drop_foreign_key(&self, stmt: &ForeignKeyDropStatement) -> Result<()> {
        self.execute_raw(&self.render_drop_foreign_key(stmt)).await
    }

    /// Execute a single statement as-is.
    pub async fn execute_raw(&self, sql: &str) -> Result<()> {
        let pool = self.connection.pool()?;
        debug!("Executing on '{}': {}", self.connection.name(), sql);

        sqlx::query(sql).execute(pool).await.map_err(|e| {
            CapstanError::Database(format!("Failed to execute '{}': {}", sql, e))
        })?;
        Ok(())
    }

    /// Whether a table exists in the connection's database.
    pub async fn has_table(&self, table: &str) -> Result<bool> {
        let pool = self.connection.pool()?;
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM information_schema.tables
            WHERE table_schema = DATABASE() AND table_name = ?
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await
        .map_err(|e| CapstanError::Database(format!("Failed to inspect table {}: {}", table, e)))?;

        Ok(count > 0)
    }

    /// Whether a column exists on a table.
    pub async fn has_column(&self, table: &str, column: &str) -> Result<bool> {
        let pool = self.connection.pool()?;
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM information_schema.columns
            WHERE table_schema = DATABASE() AND table_name = ? AND column_name = ?
            "#,
        )
        .bind(table)
        .bind(column)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            CapstanError::Database(format!(
                "Failed to inspect column {}.{}: {}",
                table, column, e
            ))
        })?;

        Ok(count > 0)
    }

    /// Drop a table if it exists.
    pub async fn drop_if_exists(&self, table: &str) -> Result<()> {
        info!("Dropping table {} if present", table);
        let stmt = sea_query::Table::drop()
            .table(sea_query::Alias::new(table))
            .if_exists()
            .to_owned();
        self.drop_table(&stmt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::ConnectionManager;
    use capstan_core::descriptor::ConnectionDescriptor;
    use capstan_core::env::EnvSnapshot;
    use sea_query::{Alias, ColumnDef, ForeignKey, ForeignKeyAction, Index, Table};

    fn schema(host: &str, port: &str) -> SchemaBuilder {
        let mut manager = ConnectionManager::new();
        manager.add_connection(
            ConnectionDescriptor::from_env(&EnvSnapshot {
                host: host.into(),
                name: "test".into(),
                user: "root".into(),
                password: "secret".into(),
                port: port.into(),
            }),
            None,
        );
        manager.schema().unwrap()
    }

    fn users_table() -> TableCreateStatement {
        Table::create()
            .table(Alias::new("users"))
            .if_not_exists()
            .col(
                ColumnDef::new(Alias::new("id"))
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new(Alias::new("email")).string_len(255).not_null())
            .to_owned()
    }

    #[test]
    fn test_create_table_uses_connection_charset() {
        let sql = schema("localhost", "3306").render_create_table(&users_table());

        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS `users`"));
        assert!(sql.contains("`email` varchar(255) NOT NULL"));
        assert!(sql.contains("DEFAULT CHARSET=utf8"));
        assert!(sql.contains("COLLATE=utf8_unicode_ci"));
    }

    #[test]
    fn test_render_does_not_open_pool() {
        let schema = schema("", "");
        schema.render_create_table(&users_table());
        assert!(!schema.connection().is_materialized());
    }

    #[test]
    fn test_render_drop_and_rename() {
        let schema = schema("localhost", "3306");

        let drop = Table::drop().table(Alias::new("users")).to_owned();
        assert_eq!(schema.render_drop_table(&drop), "DROP TABLE `users`");

        let rename = Table::rename()
            .table(Alias::new("users"), Alias::new("accounts"))
            .to_owned();
        assert_eq!(
            schema.render_rename_table(&rename),
            "RENAME TABLE `users` TO `accounts`"
        );
    }

    #[test]
    fn test_render_alter_add_column() {
        let schema = schema("localhost", "3306");
        let alter = Table::alter()
            .table(Alias::new("users"))
            .add_column(ColumnDef::new(Alias::new("nickname")).string_len(64).null())
            .to_owned();

        let sql = schema.render_alter_table(&alter);
        assert!(sql.starts_with("ALTER TABLE `users` ADD COLUMN `nickname`"));
    }

    #[test]
    fn test_render_index_and_foreign_key() {
        let schema = schema("localhost", "3306");

        let index = Index::create()
            .name("idx_users_email")
            .table(Alias::new("users"))
            .col(Alias::new("email"))
            .unique()
            .to_owned();
        let sql = schema.render_create_index(&index);
        assert!(sql.contains("UNIQUE INDEX `idx_users_email` ON `users`"));

        let fk = ForeignKey::create()
            .name("fk_posts_user_id")
            .from(Alias::new("posts"), Alias::new("user_id"))
            .to(Alias::new("users"), Alias::new("id"))
            .on_delete(ForeignKeyAction::Cascade)
            .to_owned();
        let sql = schema.render_create_foreign_key(&fk);
        assert!(sql.contains("FOREIGN KEY (`user_id`) REFERENCES `users` (`id`)"));
        assert!(sql.contains("ON DELETE CASCADE"));
    }

    #[tokio::test]
    async fn test_empty_host_fails_on_first_operation() {
        let schema = schema("", "3306");

        let err = schema.create_table(&users_table()).await.unwrap_err();
        assert!(matches!(err, CapstanError::Config(_)));
    }

    #[tokio::test]
    async fn test_invalid_port_fails_on_first_operation() {
        let schema = schema("localhost", "three-three-oh-six");

        let err = schema.has_table("users").await.unwrap_err();
        assert!(matches!(err, CapstanError::InvalidPort { .. }));
    }
}
