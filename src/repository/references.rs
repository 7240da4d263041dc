//! Guarded hard deletes of reference rows (roles, authors, material types, loan statuses)

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use super::{finish, ReferenceStore};
use crate::{
    error::{AppError, AppResult},
    models::reference::ReferenceKind,
};

#[derive(Clone)]
pub struct ReferencesRepository {
    pool: Pool<Postgres>,
}

impl ReferencesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn delete_in(
        tx: &mut Transaction<'_, Postgres>,
        kind: ReferenceKind,
        id: Uuid,
        required: &[String],
    ) -> AppResult<()> {
        // The row lock conflicts with foreign key checks of concurrent inserts
        let name: String = sqlx::query_scalar(&kind.lock_sql())
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("{} with id {} not found", kind.display_name(), id))
            })?;

        if required.contains(&name) {
            return Err(AppError::Conflict(format!(
                "{} '{}' is required by the server and cannot be deleted",
                kind.display_name(),
                name
            )));
        }

        let dependents: i64 = sqlx::query_scalar(&kind.count_dependents_sql())
            .bind(id)
            .fetch_one(&mut **tx)
            .await?;

        if dependents > 0 {
            return Err(AppError::InUse {
                entity: kind.label(),
                dependent_kind: kind.dependent_label(),
                dependents,
            });
        }

        sqlx::query(&kind.delete_sql())
            .bind(id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl ReferenceStore for ReferencesRepository {
    async fn hard_delete_if_unreferenced(
        &self,
        kind: ReferenceKind,
        id: Uuid,
        required: Vec<String>,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let result = Self::delete_in(&mut tx, kind, id, &required).await;
        finish(tx, result).await
    }
}
