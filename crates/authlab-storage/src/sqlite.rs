use std::time::Duration;

use authlab_core::{Error, GeneralStorage};
use serde_json::Value;
use sqlx::SqlitePool;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    expires_at INTEGER
)";

/// Key/value records in the shared database, expiry kept as unix millis.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub async fn new(pool: SqlitePool) -> Result<Self, Error> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn alive(expires_at: Option<i64>, now: i64) -> bool {
    expires_at.map_or(true, |expires_at| expires_at > now)
}

impl GeneralStorage for SqliteStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        let raw = sqlx::query_scalar::<_, String>(
            "SELECT value FROM kv WHERE key = ? AND (expires_at IS NULL OR expires_at > ?)",
        )
        .bind(key)
        .bind(now_millis())
        .fetch_optional(&self.pool)
        .await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), Error> {
        let expires_at = ttl.map(|ttl| now_millis() + ttl.as_millis() as i64);
        sqlx::query(
            "INSERT INTO kv (key, value, expires_at) VALUES (?, ?, ?)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
        )
        .bind(key)
        .bind(serde_json::to_string(&value)?)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<Value>, Error> {
        let row = sqlx::query_as::<_, (String, Option<i64>)>(
            "DELETE FROM kv WHERE key = ? RETURNING value, expires_at",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some((raw, expires_at)) if alive(expires_at, now_millis()) => {
                Ok(Some(serde_json::from_str(&raw)?))
            }
            _ => Ok(None),
        }
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM kv WHERE expires_at IS NOT NULL AND expires_at <= ?")
            .bind(now_millis())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
