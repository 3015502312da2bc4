use rust_embed::RustEmbed;
use sqlx::{Executor, PgPool};
use std::str;

use crate::error::{Result, StoreError};

#[derive(RustEmbed)]
#[folder = "schema/"]
struct SchemaAssets;

const BUILD_ORDER: &str = "00_build_order.sql";

/// Reads the build order and applies all SQL files in a single transaction.
pub async fn rebuild_database(pool: &PgPool) -> Result<()> {
    let script = assemble_script()?;

    let mut tx = pool.begin().await?;
    (&mut *tx).execute(script.as_str()).await?;
    tx.commit().await?;

    tracing::info!("schema applied");
    Ok(())
}

/// Drops and recreates the public schema. Destroys all data.
pub async fn reset_database(pool: &PgPool) -> Result<()> {
    tracing::warn!("dropping public schema");
    pool.execute("DROP SCHEMA public CASCADE; CREATE SCHEMA public;").await?;
    Ok(())
}

/// Expands the manifest's `-- @include` directives into one script.
pub fn assemble_script() -> Result<String> {
    let manifest = get_file_content(BUILD_ORDER)?;
    let mut full_script = String::new();

    for line in manifest.lines() {
        let trimmed = line.trim();

        if let Some(path) = parse_include_directive(trimmed) {
            tracing::debug!(file = path, "including schema file");
            full_script.push_str(&get_file_content(path)?);
            full_script.push('\n');
        } else if !trimmed.starts_with("--") {
            full_script.push_str(line);
            full_script.push('\n');
        }
    }

    Ok(full_script)
}

fn get_file_content(path: &str) -> Result<String> {
    let file = SchemaAssets::get(path)
        .ok_or_else(|| StoreError::UnknownSchema(format!("missing embedded schema file: {}", path)))?;
    str::from_utf8(file.data.as_ref())
        .map(str::to_string)
        .map_err(|e| StoreError::Corrupt(format!("{} is not UTF-8: {}", path, e)))
}

fn parse_include_directive(line: &str) -> Option<&str> {
    if line.starts_with("--") && line.contains("@include") {
        line.split_whitespace().last()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_include_directive() {
        assert_eq!(parse_include_directive("-- @include tables/x.sql"), Some("tables/x.sql"));
        assert_eq!(parse_include_directive("-- plain comment"), None);
        assert_eq!(parse_include_directive("SELECT 1;"), None);
    }

    #[test]
    fn test_script_creates_tables_before_seeding() {
        let script = assemble_script().unwrap();

        let materials = script.find("CREATE TABLE IF NOT EXISTS materials").unwrap();
        let collections = script.find("CREATE TABLE IF NOT EXISTS collections").unwrap();
        let items = script.find("CREATE TABLE IF NOT EXISTS collection_line_items").unwrap();
        let seed = script.find("INSERT INTO materials").unwrap();

        assert!(materials < collections && collections < items && items < seed);
        assert!(!script.contains("@include"));
    }

    #[test]
    fn test_seed_matches_default_catalogue() {
        let seed = get_file_content("seed/materials.sql").unwrap();
        for m in woza_core::default_materials() {
            assert!(seed.contains(&format!("('{}',", m.id)), "seed is missing '{}'", m.id);
        }
    }
}
