mod memory;
mod sqlite;
mod users;

use std::{str::FromStr, time::Duration};

use authlab_core::{DatabaseConfig, Error, GeneralStorage, StorageConfig};
pub use memory::*;
use serde_json::Value;
pub use sqlite::*;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
pub use users::*;

#[derive(Clone)]
pub enum Storage {
    Memory(MemoryStorage),
    Sqlite(SqliteStorage),
}

impl Storage {
    pub async fn new(config: &StorageConfig, pool: SqlitePool) -> Result<Self, Error> {
        match config {
            StorageConfig::Memory => {
                tracing::warn!("Memory storage enabled, pending authorizations are lost on restart, don't use more than one replica for service");
                Ok(Self::Memory(MemoryStorage::new()))
            }
            StorageConfig::Sqlite => Ok(Self::Sqlite(SqliteStorage::new(pool).await?)),
        }
    }
}

impl GeneralStorage for Storage {
    async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        match self {
            Self::Memory(storage) => storage.get(key).await,
            Self::Sqlite(storage) => storage.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), Error> {
        match self {
            Self::Memory(storage) => storage.set(key, value, ttl).await,
            Self::Sqlite(storage) => storage.set(key, value, ttl).await,
        }
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        match self {
            Self::Memory(storage) => storage.remove(key).await,
            Self::Sqlite(storage) => storage.remove(key).await,
        }
    }

    async fn take(&self, key: &str) -> Result<Option<Value>, Error> {
        match self {
            Self::Memory(storage) => storage.take(key).await,
            Self::Sqlite(storage) => storage.take(key).await,
        }
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        match self {
            Self::Memory(storage) => storage.purge_expired().await,
            Self::Sqlite(storage) => storage.purge_expired().await,
        }
    }
}

/// Opens the sqlite pool. An in-memory database lives inside a single
/// connection, so the pool is pinned to exactly one that never expires.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, Error> {
    let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
    let pool = if config.is_in_memory() {
        tracing::warn!("In-memory database enabled, users and refresh tokens are lost on restart");
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(config.max_connections)
    };
    Ok(pool.connect_with(options).await?)
}
