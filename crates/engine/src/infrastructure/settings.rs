//! SQLite-backed settings storage.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::infrastructure::ports::{ClockPort, RepoError, SettingsRepo};

/// SQLite implementation for system settings storage.
///
/// One row per setting key, value stored as JSON text.
pub struct SqliteSettingsRepo {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

impl SqliteSettingsRepo {
    pub async fn new(db_path: &str, clock: Arc<dyn ClockPort>) -> Result<Self, RepoError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(|e| RepoError::database("settings", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS system_settings (
                key TEXT PRIMARY KEY NOT NULL,
                value_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("settings", e))?;

        Ok(Self { pool, clock })
    }
}

#[async_trait]
impl SettingsRepo for SqliteSettingsRepo {
    async fn get(&self, key: &str) -> Result<Option<Value>, RepoError> {
        let row = sqlx::query("SELECT value_json FROM system_settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("settings", e))?;

        match row {
            Some(row) => {
                let json: String = row.get("value_json");
                let value = serde_json::from_str(&json)
                    .map_err(|e| RepoError::Serialization(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), RepoError> {
        let json =
            serde_json::to_string(&value).map_err(|e| RepoError::Serialization(e.to_string()))?;
        let now = self.clock.now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO system_settings (key, value_json, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value_json = excluded.value_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(json)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("settings", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use chrono::Utc;
    use serde_json::json;

    async fn repo(dir: &tempfile::TempDir) -> SqliteSettingsRepo {
        let path = dir.path().join("settings.db");
        SqliteSettingsRepo::new(
            path.to_str().expect("utf-8 temp path"),
            Arc::new(FixedClock(Utc::now())),
        )
        .await
        .expect("settings db opens")
    }

    #[tokio::test]
    async fn missing_keys_read_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = repo(&dir).await;
        assert_eq!(repo.get("trackLightSources").await.expect("get"), None);
    }

    #[tokio::test]
    async fn set_overwrites_existing_value() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = repo(&dir).await;

        repo.set("schemaVersion", json!(230417.2)).await.expect("first set");
        repo.set("schemaVersion", json!(230501)).await.expect("second set");

        assert_eq!(
            repo.get("schemaVersion").await.expect("get"),
            Some(json!(230501))
        );
    }

    #[tokio::test]
    async fn values_survive_reopening() {
        let dir = tempfile::tempdir().expect("tempdir");
        repo(&dir)
            .await
            .set("trackLightSourcesInterval", json!(30))
            .await
            .expect("set");

        let reopened = repo(&dir).await;
        assert_eq!(
            reopened.get("trackLightSourcesInterval").await.expect("get"),
            Some(json!(30))
        );
    }
}
