use async_trait::async_trait;
use medrova_application::RuntimeConfigRepository;
use medrova_core::{AppError, AppResult};
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed runtime configuration repository.
#[derive(Clone)]
pub struct PostgresRuntimeConfig {
    pool: PgPool,
}

impl PostgresRuntimeConfig {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ValueRow {
    value: String,
}

#[async_trait]
impl RuntimeConfigRepository for PostgresRuntimeConfig {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let row = sqlx::query_as::<_, ValueRow>(
            r#"
            SELECT value
            FROM runtime_config
            WHERE config_key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read config: {error}")))?;

        Ok(row.map(|row| row.value))
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO runtime_config (config_key, value)
            VALUES ($1, $2)
            ON CONFLICT (config_key) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to write config: {error}")))?;

        Ok(())
    }
}
