//! Settings database operations
//!
//! Key-value accessors over the `settings` table. The only persisted
//! configuration value is the classification API token.

use pgc_common::{Error, Result};
use sqlx::{Pool, Sqlite};

/// Storage key of the classification API token
pub const API_TOKEN_KEY: &str = "apiToken";

/// Get the stored API token, if any
pub async fn get_api_token(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, API_TOKEN_KEY).await
}

/// Store the API token, replacing any previous value
pub async fn set_api_token(db: &Pool<Sqlite>, token: &str) -> Result<()> {
    set_setting(db, API_TOKEN_KEY, token).await
}

/// Remove the stored API token
pub async fn clear_api_token(db: &Pool<Sqlite>) -> Result<()> {
    delete_setting(db, API_TOKEN_KEY).await
}

/// Generic setting getter
pub async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting '{}' failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter (upsert)
pub async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}

pub async fn delete_setting(db: &Pool<Sqlite>, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM settings WHERE key = ?")
        .bind(key)
        .execute(db)
        .await
        .map_err(Error::Database)?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    /// In-memory database with the production settings schema
    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        pgc_common::db::create_settings_table(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_get_api_token_not_set() {
        let pool = setup_test_db().await;
        assert_eq!(get_api_token(&pool).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_and_get_api_token() {
        let pool = setup_test_db().await;

        set_api_token(&pool, "hf_abc123").await.unwrap();

        assert_eq!(get_api_token(&pool).await.unwrap(), Some("hf_abc123".to_string()));
    }

    #[tokio::test]
    async fn test_set_api_token_update() {
        let pool = setup_test_db().await;

        set_api_token(&pool, "old").await.unwrap();
        set_api_token(&pool, "new").await.unwrap();

        assert_eq!(get_api_token(&pool).await.unwrap(), Some("new".to_string()));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings WHERE key = 'apiToken'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1, "Should have exactly one entry after update");
    }

    #[tokio::test]
    async fn test_clear_api_token() {
        let pool = setup_test_db().await;

        set_api_token(&pool, "hf_abc123").await.unwrap();
        clear_api_token(&pool).await.unwrap();
        assert_eq!(get_api_token(&pool).await.unwrap(), None);

        // Clearing twice is fine
        clear_api_token(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_generic_setting_parse_error() {
        let pool = setup_test_db().await;

        set_setting(&pool, "retries", "three").await.unwrap();
        assert!(get_setting::<u32>(&pool, "retries").await.is_err());

        set_setting(&pool, "retries", 3).await.unwrap();
        assert_eq!(get_setting::<u32>(&pool, "retries").await.unwrap(), Some(3));
    }
}
