use authlab_core::Error;
use sqlx::SqlitePool;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS user (
    id TEXT PRIMARY KEY NOT NULL DEFAULT (lower(hex(randomblob(16)))),
    email TEXT NOT NULL UNIQUE
)";

/// Maps email addresses to stable user identifiers.
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), Error> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Upserts the user row and returns its id. The no-op update makes
    /// `RETURNING` yield the existing row when the email is already known.
    pub async fn find_or_create_user(&self, email: &str) -> Result<String, Error> {
        let id = sqlx::query_scalar::<_, String>(
            "INSERT INTO user (email) VALUES (?) ON CONFLICT (email) DO UPDATE SET email = email RETURNING id",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(id) = id else {
            return Err(Error::UserNotFound(email.to_string()));
        };
        tracing::info!("Found or created user {} with email {}", id, email);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect;
    use authlab_core::DatabaseConfig;

    async fn repository() -> UserRepository {
        let pool = connect(&DatabaseConfig::in_memory()).await.unwrap();
        let users = UserRepository::new(pool);
        users.migrate().await.unwrap();
        users
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let users = repository().await;
        let first = users.find_or_create_user("ada@example.com").await.unwrap();
        let second = users.find_or_create_user("ada@example.com").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
    }

    #[tokio::test]
    async fn distinct_emails_get_distinct_ids() {
        let users = repository().await;
        let ada = users.find_or_create_user("ada@example.com").await.unwrap();
        let grace = users.find_or_create_user("grace@example.com").await.unwrap();

        assert_ne!(ada, grace);
        assert_eq!(
            users.find_or_create_user("grace@example.com").await.unwrap(),
            grace
        );
    }

    #[tokio::test]
    async fn migrate_twice_keeps_rows() {
        let users = repository().await;
        let id = users.find_or_create_user("ada@example.com").await.unwrap();
        users.migrate().await.unwrap();

        assert_eq!(users.find_or_create_user("ada@example.com").await.unwrap(), id);
    }

    #[tokio::test]
    async fn missing_table_propagates_database_error() {
        let pool = connect(&DatabaseConfig::in_memory()).await.unwrap();
        let users = UserRepository::new(pool);

        let err = users.find_or_create_user("ada@example.com").await.unwrap_err();
        assert!(matches!(err, Error::SqlxError(_)));
    }
}
