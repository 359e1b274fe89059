use async_trait::async_trait;

use super::manager::DatabaseError;
use super::repository::PgStore;
use super::SequenceStore;

#[async_trait]
impl SequenceStore for PgStore {
    async fn next_value(&self, name: &str) -> Result<i64, DatabaseError> {
        // Single statement so concurrent callers never observe the same value.
        let value: Option<i64> = sqlx::query_scalar(
            "UPDATE sequences SET value = value + 1 WHERE name = $1 RETURNING value",
        )
        .bind(name)
        .fetch_optional(self.pool())
        .await?;

        value.ok_or_else(|| DatabaseError::SequenceMissing(name.to_string()))
    }

    async fn exists(&self, name: &str) -> Result<bool, DatabaseError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT value FROM sequences WHERE name = $1")
            .bind(name)
            .fetch_optional(self.pool())
            .await?;
        Ok(found.is_some())
    }

    async fn seed(&self, name: &str, value: i64) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO sequences (name, value) VALUES ($1, $2)
             ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(name)
        .bind(value)
        .execute(self.pool())
        .await?;
        Ok(())
    }
}
