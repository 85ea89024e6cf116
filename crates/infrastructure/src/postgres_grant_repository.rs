use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use medrova_application::GrantRepository;
use medrova_core::{AppError, AppResult};
use medrova_domain::{AccessGrant, BasisType, GrantKey, GranteeType};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed repository for persisted access grants.
#[derive(Clone)]
pub struct PostgresGrantRepository {
    pool: PgPool,
}

impl PostgresGrantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct GrantRow {
    grant_id: Uuid,
    grantee_id: String,
    grantee_type: String,
    basis_id: String,
    basis_type: String,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl GrantRow {
    fn into_grant(self) -> AppResult<AccessGrant> {
        let grantee_type = GranteeType::from_str(self.grantee_type.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode grantee type '{}': {error}",
                self.grantee_type
            ))
        })?;
        let basis_type = BasisType::from_str(self.basis_type.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode basis type '{}': {error}",
                self.basis_type
            ))
        })?;

        AccessGrant::from_parts(
            self.grant_id,
            self.grantee_id,
            grantee_type,
            self.basis_id,
            basis_type,
            self.created_by,
            self.created_at,
        )
    }
}

#[async_trait]
impl GrantRepository for PostgresGrantRepository {
    async fn save(&self, grant: AccessGrant) -> AppResult<AccessGrant> {
        sqlx::query(
            r#"
            INSERT INTO access_grants (
                grant_id,
                grantee_id,
                grantee_type,
                basis_id,
                basis_type,
                created_by,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(grant.grant_id())
        .bind(grant.grantee_id())
        .bind(grant.grantee_type().as_str())
        .bind(grant.basis_id())
        .bind(grant.basis_type().as_str())
        .bind(grant.created_by())
        .bind(grant.created_at())
        .execute(&self.pool)
        .await
        .map_err(|error| match &error {
            sqlx::Error::Database(database_error) if database_error.is_unique_violation() => {
                AppError::Conflict(format!(
                    "grant from {} '{}' to {} '{}' already exists",
                    grant.grantee_type(),
                    grant.grantee_id(),
                    grant.basis_type(),
                    grant.basis_id()
                ))
            }
            _ => AppError::Internal(format!("failed to save grant: {error}")),
        })?;

        Ok(grant)
    }

    async fn delete(&self, key: &GrantKey) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM access_grants
            WHERE LOWER(grantee_id) = $1
                AND grantee_type = $2
                AND LOWER(basis_id) = $3
                AND basis_type = $4
            "#,
        )
        .bind(key.grantee_id())
        .bind(key.grantee_type().as_str())
        .bind(key.basis_id())
        .bind(key.basis_type().as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete grant: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "no grant from {} '{}' to {} '{}'",
                key.grantee_type(),
                key.grantee_id(),
                key.basis_type(),
                key.basis_id()
            )));
        }

        Ok(())
    }

    async fn find(&self, key: &GrantKey) -> AppResult<Option<AccessGrant>> {
        let row = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT grant_id, grantee_id, grantee_type, basis_id, basis_type,
                created_by, created_at
            FROM access_grants
            WHERE LOWER(grantee_id) = $1
                AND grantee_type = $2
                AND LOWER(basis_id) = $3
                AND basis_type = $4
            "#,
        )
        .bind(key.grantee_id())
        .bind(key.grantee_type().as_str())
        .bind(key.basis_id())
        .bind(key.basis_type().as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find grant: {error}")))?;

        row.map(GrantRow::into_grant).transpose()
    }

    async fn find_all(
        &self,
        grantee_id: &str,
        grantee_type: GranteeType,
        basis_type: BasisType,
    ) -> AppResult<Vec<AccessGrant>> {
        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT grant_id, grantee_id, grantee_type, basis_id, basis_type,
                created_by, created_at
            FROM access_grants
            WHERE LOWER(grantee_id) = LOWER($1)
                AND grantee_type = $2
                AND basis_type = $3
            ORDER BY basis_id
            "#,
        )
        .bind(grantee_id)
        .bind(grantee_type.as_str())
        .bind(basis_type.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list grants: {error}")))?;

        rows.into_iter().map(GrantRow::into_grant).collect()
    }

    async fn find_by_basis(
        &self,
        grantee_type: GranteeType,
        basis_type: BasisType,
        basis_id: &str,
    ) -> AppResult<Vec<AccessGrant>> {
        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT grant_id, grantee_id, grantee_type, basis_id, basis_type,
                created_by, created_at
            FROM access_grants
            WHERE grantee_type = $1
                AND basis_type = $2
                AND LOWER(basis_id) = LOWER($3)
            ORDER BY grantee_id
            "#,
        )
        .bind(grantee_type.as_str())
        .bind(basis_type.as_str())
        .bind(basis_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list grants by basis: {error}"))
        })?;

        rows.into_iter().map(GrantRow::into_grant).collect()
    }

    async fn role_grantee_names(&self, basis_type: BasisType) -> AppResult<BTreeSet<String>> {
        #[derive(FromRow)]
        struct NameRow {
            grantee_id: String,
        }

        let rows = sqlx::query_as::<_, NameRow>(
            r#"
            SELECT DISTINCT grantee_id
            FROM access_grants
            WHERE grantee_type = $1
                AND basis_type = $2
            "#,
        )
        .bind(GranteeType::Role.as_str())
        .bind(basis_type.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list role grantees: {error}"))
        })?;

        Ok(rows.into_iter().map(|row| row.grantee_id).collect())
    }
}

#[cfg(test)]
mod tests {
    use medrova_application::GrantRepository;
    use medrova_domain::{AccessGrant, BasisType, GrantKey, GranteeType};
    use sqlx::PgPool;
    use sqlx::migrate::Migrator;
    use sqlx::postgres::PgPoolOptions;

    use super::PostgresGrantRepository;

    static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

    async fn test_pool() -> Option<PgPool> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            return None;
        };

        let pool = match PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url.as_str())
            .await
        {
            Ok(pool) => pool,
            Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
        };

        if let Err(error) = MIGRATOR.run(&pool).await {
            panic!("failed to run migrations for postgres grant tests: {error}");
        }

        Some(pool)
    }

    fn grant(grantee: &str, basis: &str) -> AccessGrant {
        AccessGrant::new(grantee, GranteeType::User, basis, BasisType::Location, "admin")
            .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn save_find_delete_round_trip() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let repository = PostgresGrantRepository::new(pool);
        let grantee = format!("user-{}", uuid::Uuid::new_v4());

        let saved = repository.save(grant(grantee.as_str(), "Ward-1")).await;
        assert!(saved.is_ok());

        let key = GrantKey::new(
            grantee.to_ascii_uppercase(),
            GranteeType::User,
            "ward-1",
            BasisType::Location,
        );
        assert!(key.is_ok());
        let Ok(key) = key else {
            return;
        };

        let found = repository.find(&key).await;
        assert!(found.is_ok());
        assert!(found.unwrap_or_default().is_some());

        let duplicate = repository.save(grant(grantee.as_str(), "ward-1")).await;
        assert!(duplicate.is_err());

        let deleted = repository.delete(&key).await;
        assert!(deleted.is_ok());

        let found = repository.find(&key).await;
        assert!(found.unwrap_or_default().is_none());
    }
}
