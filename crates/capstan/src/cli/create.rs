use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use console::style;
use std::fs;
use std::path::{Path, PathBuf};

use super::GlobalArgs;

/// Create a new migration file.
#[derive(Parser)]
pub struct CreateCommand {
    /// Migration name (PascalCase or snake_case).
    pub name: String,

    /// Target directory (defaults to paths.migrations).
    #[arg(long)]
    pub path: Option<String>,
}

impl CreateCommand {
    pub fn execute(self, global: &GlobalArgs) -> Result<()> {
        let dir = match self.path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(global.runner_config()?.paths.migrations),
        };

        let file_path = create_migration(&dir, &self.name, Utc::now())?;

        println!(
            "{} Created migration: {}",
            style("✅").green(),
            style(file_path.display()).cyan()
        );
        Ok(())
    }
}

/// Write the migration source and return its path.
///
/// Names must be unique across the directory regardless of timestamp.
fn create_migration(dir: &Path, name: &str, now: DateTime<Utc>) -> Result<PathBuf> {
    let snake_name = to_snake_case(name);
    let pascal_name = to_pascal_case(&snake_name);

    if snake_name.is_empty() || !snake_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        anyhow::bail!("Invalid migration name: {}", name);
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    for entry in fs::read_dir(dir)? {
        let file_name = entry?.file_name();
        if migration_name(&file_name.to_string_lossy()) == Some(snake_name.as_str()) {
            anyhow::bail!(
                "A migration named {} already exists: {}",
                snake_name,
                dir.join(file_name).display()
            );
        }
    }

    let stem = format!("{}_{}", now.format("%Y%m%d%H%M%S"), snake_name);
    let file_path = dir.join(format!("{}.rs", stem));
    fs::write(&file_path, render_template(&pascal_name, &stem))?;

    Ok(file_path)
}

/// Name part of `<YYYYMMDDHHMMSS>_<name>.rs`, or `None` for other files.
fn migration_name(file_name: &str) -> Option<&str> {
    let stem = file_name.strip_suffix(".rs")?;
    let timestamp = stem.get(..14)?;
    let name = &stem[timestamp.len()..];
    if !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.strip_prefix('_').filter(|name| !name.is_empty())
}

fn render_template(pascal_name: &str, stem: &str) -> String {
    format!(
        r#"use capstan::prelude::*;

pub struct {pascal_name};

#[async_trait]
impl Migration for {pascal_name} {{
    fn name(&self) -> &str {{
        "{stem}"
    }}

    async fn up(&self, ctx: &MigrationContext) -> Result<()> {{
        // ctx.schema.create_table(&Table::create()...to_owned()).await
        let _ = ctx;
        Ok(())
    }}

    async fn down(&self, ctx: &MigrationContext) -> Result<()> {{
        let _ = ctx;
        Ok(())
    }}
}}
"#
    )
}

/// Convert to PascalCase.
fn to_pascal_case(s: &str) -> String {
    let mut result = String::new();
    let mut capitalize_next = true;

    for c in s.chars() {
        if c == '_' || c == '-' {
            capitalize_next = true;
        } else if capitalize_next {
            result.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    result
}

/// Convert to snake_case.
fn to_snake_case(s: &str) -> String {
    let mut result = String::new();

    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !result.ends_with('_') {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else if c == '-' || c == ' ' {
            result.push('_');
        } else {
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
    }

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("create_users"), "CreateUsers");
        assert_eq!(to_pascal_case("add-index"), "AddIndex");
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("CreateUsers"), "create_users");
        assert_eq!(to_snake_case("create_users"), "create_users");
        assert_eq!(to_snake_case("Add_Index"), "add_index");
    }

    #[test]
    fn test_create_migration_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("src/migrations");

        let path = create_migration(&target, "CreateUsers", at()).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "20240305140709_create_users.rs"
        );
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("pub struct CreateUsers;"));
        assert!(content.contains("\"20240305140709_create_users\""));
    }

    #[test]
    fn test_create_refuses_duplicate_name() {
        let dir = TempDir::new().unwrap();
        create_migration(dir.path(), "CreateUsers", at()).unwrap();

        let later = at() + chrono::Duration::seconds(60);
        let err = create_migration(dir.path(), "create_users", later).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_create_allows_name_that_is_a_suffix_of_another() {
        let dir = TempDir::new().unwrap();
        create_migration(dir.path(), "CreateUsers", at()).unwrap();

        let later = at() + chrono::Duration::seconds(60);
        let path = create_migration(dir.path(), "Users", later).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "20240305140809_users.rs"
        );
    }

    #[test]
    fn test_migration_name() {
        assert_eq!(
            migration_name("20240305140709_create_users.rs"),
            Some("create_users")
        );
        assert_eq!(migration_name("20240305140709_.rs"), None);
        assert_eq!(migration_name("2024030514070_create_users.rs"), None);
        assert_eq!(migration_name("mod.rs"), None);
        assert_eq!(migration_name("20240305140709_create_users.sql"), None);
    }

    #[test]
    fn test_create_rejects_invalid_name() {
        let dir = TempDir::new().unwrap();
        assert!(create_migration(dir.path(), "drop users!", at()).is_err());
        assert!(create_migration(dir.path(), "", at()).is_err());
    }
}
