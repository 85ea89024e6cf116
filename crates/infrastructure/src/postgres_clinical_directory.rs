use std::collections::BTreeSet;

use async_trait::async_trait;
use medrova_application::{EncounterDirectory, LocationHierarchy, PersonClassificationDirectory};
use medrova_core::{AppError, AppResult};
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed clinical directory.
///
/// Reads the platform's location, person-attribute, and encounter tables;
/// this adapter never writes.
#[derive(Clone)]
pub struct PostgresClinicalDirectory {
    pool: PgPool,
}

impl PostgresClinicalDirectory {
    /// Creates a directory with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct IdRow {
    id: String,
}

#[async_trait]
impl LocationHierarchy for PostgresClinicalDirectory {
    async fn descendant_ids(
        &self,
        location_id: &str,
        include_self: bool,
    ) -> AppResult<Vec<String>> {
        let rows = sqlx::query_as::<_, IdRow>(
            r#"
            WITH RECURSIVE descendants AS (
                SELECT location_id
                FROM locations
                WHERE parent_location_id = $1
                UNION ALL
                SELECT child.location_id
                FROM locations AS child
                INNER JOIN descendants
                    ON child.parent_location_id = descendants.location_id
            )
            SELECT location_id AS id FROM descendants
            "#,
        )
        .bind(location_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to expand location hierarchy: {error}"))
        })?;

        let mut ids = Vec::with_capacity(rows.len() + usize::from(include_self));
        if include_self {
            ids.push(location_id.to_owned());
        }
        ids.extend(rows.into_iter().map(|row| row.id));

        Ok(ids)
    }
}

#[async_trait]
impl PersonClassificationDirectory for PostgresClinicalDirectory {
    async fn owner_ids_for_attribute(
        &self,
        attribute_type_id: i64,
        values: &BTreeSet<String>,
    ) -> AppResult<BTreeSet<String>> {
        let candidates: Vec<String> = values.iter().cloned().collect();
        let rows = sqlx::query_as::<_, IdRow>(
            r#"
            SELECT DISTINCT person_id AS id
            FROM person_attributes
            WHERE attribute_type_id = $1
                AND voided = FALSE
                AND value = ANY($2)
            "#,
        )
        .bind(attribute_type_id)
        .bind(candidates)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to resolve classified owners: {error}"))
        })?;

        Ok(rows.into_iter().map(|row| row.id).collect())
    }
}

#[async_trait]
impl EncounterDirectory for PostgresClinicalDirectory {
    async fn encounter_type_of(&self, encounter_id: &str) -> AppResult<Option<String>> {
        let row = sqlx::query_as::<_, IdRow>(
            r#"
            SELECT encounter_type_id AS id
            FROM encounters
            WHERE encounter_id = $1
            "#,
        )
        .bind(encounter_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to look up encounter type: {error}"))
        })?;

        Ok(row.map(|row| row.id))
    }

    async fn view_privilege_of(&self, encounter_type_id: &str) -> AppResult<Option<String>> {
        let row = sqlx::query_as::<_, IdRow>(
            r#"
            SELECT view_privilege AS id
            FROM encounter_types
            WHERE encounter_type_id = $1
                AND view_privilege IS NOT NULL
            "#,
        )
        .bind(encounter_type_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to look up view privilege: {error}"))
        })?;

        Ok(row.map(|row| row.id))
    }
}
