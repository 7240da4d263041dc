//! Materials repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use super::{finish, MaterialStore};
use crate::{
    error::{AppError, AppResult},
    models::material::{CreateMaterial, Material, UpdateMaterial},
};

const MATERIAL_SELECT: &str = r#"
    SELECT id, title, author_id, type_id, is_deleted, date_added,
           created_by, updated_by, updated_at
    FROM materials
"#;

#[derive(Clone)]
pub struct MaterialsRepository {
    pool: Pool<Postgres>,
}

impl MaterialsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn fetch_in(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> AppResult<Material> {
        sqlx::query_as::<_, Material>(&format!("{} WHERE id = $1 AND NOT is_deleted", MATERIAL_SELECT))
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Material with id {} not found", id)))
    }

    async fn create_in(
        tx: &mut Transaction<'_, Postgres>,
        data: &CreateMaterial,
        actor: Uuid,
    ) -> AppResult<Material> {
        let now = Utc::now();

        let material = sqlx::query_as::<_, Material>(
            r#"
            INSERT INTO materials (title, author_id, type_id, is_deleted, date_added, created_by, updated_by, updated_at)
            VALUES ($1, $2, $3, FALSE, $4, $5, $5, $4)
            RETURNING id, title, author_id, type_id, is_deleted, date_added,
                      created_by, updated_by, updated_at
            "#,
        )
        .bind(&data.title)
        .bind(data.author_id)
        .bind(data.type_id)
        .bind(now)
        .bind(actor)
        .fetch_one(&mut **tx)
        .await?;

        Ok(material)
    }

    async fn update_in(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        data: &UpdateMaterial,
        actor: Uuid,
    ) -> AppResult<Material> {
        let mut sets = vec!["updated_at = $1".to_string(), "updated_by = $2".to_string()];
        let mut param_idx = 3;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, param_idx));
                    param_idx += 1;
                }
            };
        }

        add_field!(data.title, "title");
        add_field!(data.author_id, "author_id");
        add_field!(data.type_id, "type_id");

        let query = format!(
            "UPDATE materials SET {} WHERE id = ${} AND NOT is_deleted",
            sets.join(", "),
            param_idx
        );

        let mut builder = sqlx::query(&query).bind(Utc::now()).bind(actor);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.title);
        bind_field!(data.author_id);
        bind_field!(data.type_id);

        let result = builder.bind(id).execute(&mut **tx).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Material with id {} not found", id)));
        }

        Self::fetch_in(tx, id).await
    }

    async fn soft_delete_in(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        actor: Uuid,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE materials
            SET is_deleted = TRUE, updated_at = $1, updated_by = $2
            WHERE id = $3 AND NOT is_deleted
            "#,
        )
        .bind(Utc::now())
        .bind(actor)
        .bind(id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Material with id {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl MaterialStore for MaterialsRepository {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Material> {
        sqlx::query_as::<_, Material>(&format!("{} WHERE id = $1 AND NOT is_deleted", MATERIAL_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Material with id {} not found", id)))
    }

    async fn title_exists(&self, title: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM materials
                WHERE title = $1 AND NOT is_deleted
                  AND ($2::uuid IS NULL OR id != $2)
            )
            "#,
        )
        .bind(title)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create(&self, data: CreateMaterial, actor: Uuid) -> AppResult<Material> {
        let mut tx = self.pool.begin().await?;
        let result = Self::create_in(&mut tx, &data, actor).await;
        finish(tx, result).await
    }

    async fn update(&self, id: Uuid, data: UpdateMaterial, actor: Uuid) -> AppResult<Material> {
        let mut tx = self.pool.begin().await?;
        let result = Self::update_in(&mut tx, id, &data, actor).await;
        finish(tx, result).await
    }

    async fn soft_delete(&self, id: Uuid, actor: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let result = Self::soft_delete_in(&mut tx, id, actor).await;
        finish(tx, result).await
    }
}
