//! Postgres key-value backend over the `kv_entries` table.
//!
//! Versions are `BIGINT` in the table; conversion saturates rather than
//! wrapping, which only matters after 2^63 writes to one key.

use sqlx::PgPool;

use super::{KvStore, StoreError, Versioned};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_db_version(version: u64) -> i64 {
    i64::try_from(version).unwrap_or(i64::MAX)
}

fn from_db_version(version: i64) -> u64 {
    u64::try_from(version).unwrap_or(0)
}

#[async_trait::async_trait]
impl KvStore for PgStore {
    async fn get(&self, key: &str) -> Result<Option<Versioned>, StoreError> {
        let row = sqlx::query_as::<_, (String, i64)>("SELECT value, version FROM kv_entries WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value, version)| Versioned { value, version: from_db_version(version) }))
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<u64>,
        value: String,
    ) -> Result<Option<u64>, StoreError> {
        let Some(expected) = expected else {
            let result = sqlx::query(
                "INSERT INTO kv_entries (key, value, version) VALUES ($1, $2, 1) \
                 ON CONFLICT (key) DO NOTHING",
            )
            .bind(key)
            .bind(&value)
            .execute(&self.pool)
            .await?;
            return Ok((result.rows_affected() == 1).then_some(1));
        };

        let result = sqlx::query(
            "UPDATE kv_entries SET value = $2, version = version + 1, updated_at = now() \
             WHERE key = $1 AND version = $3",
        )
        .bind(key)
        .bind(&value)
        .bind(to_db_version(expected))
        .execute(&self.pool)
        .await?;

        Ok((result.rows_affected() == 1).then_some(expected + 1))
    }
}
