//! Schema definitions and migration utilities.
//!
//! This module provides embedded SQL schema definitions and utilities
//! for managing database migrations.

use sqlx::PgPool;

use crate::error::{StoreError, StoreResult};

/// Embedded migration SQL for the core schema (001_schema.sql).
pub const SCHEMA_MIGRATION: &str = include_str!("../../../migrations/001_schema.sql");

/// Tables the application expects after migrations.
pub const EXPECTED_TABLES: &[&str] = &[
    "profiles",
    "oauth_states",
    "user_integrations",
    "clio_quotes",
    "api_keys",
    "quotes",
];

/// Run all pending migrations against the database.
///
/// This function is idempotent - it can be run multiple times safely.
/// Migrations check for existing objects before creating them.
pub async fn run_migrations(pool: &PgPool) -> StoreResult<()> {
    tracing::info!("Running database migrations...");

    tracing::debug!("Running schema migration (001_schema.sql)...");
    sqlx::raw_sql(SCHEMA_MIGRATION)
        .execute(pool)
        .await
        .map_err(|e| StoreError::MigrationError(format!("Schema migration failed: {}", e)))?;

    tracing::info!("Migrations completed successfully");
    Ok(())
}

/// Return the expected tables that are missing from the public schema.
pub async fn missing_tables(pool: &PgPool) -> StoreResult<Vec<String>> {
    let present: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT table_name::text
        FROM information_schema.tables
        WHERE table_schema = 'public'
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(EXPECTED_TABLES
        .iter()
        .filter(|t| !present.iter().any(|(name,)| name == *t))
        .map(|t| (*t).to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_every_expected_table() {
        for table in EXPECTED_TABLES {
            let needle = format!("CREATE TABLE IF NOT EXISTS {} ", table);
            assert!(
                SCHEMA_MIGRATION.contains(&needle),
                "migration does not create {}",
                table
            );
        }
    }

    #[test]
    fn test_integrations_are_unique_per_user_and_provider() {
        assert!(SCHEMA_MIGRATION.contains("PRIMARY KEY (user_id, integration_name)"));
    }
}
