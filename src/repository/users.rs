//! Users repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use super::{finish, UserStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        role::Role,
        user::{NewUser, User, UserChanges},
    },
};

const USER_SELECT: &str = r#"
    SELECT u.id, u.email, u.full_name, u.password, u.role_id, r.name AS role,
           u.created_at, u.created_by, u.updated_at, u.updated_by, u.is_deleted
    FROM users u
    JOIN roles r ON r.id = u.role_id
"#;

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn fetch_in(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!("{} WHERE u.id = $1 AND NOT u.is_deleted", USER_SELECT))
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    async fn create_in(tx: &mut Transaction<'_, Postgres>, user: &NewUser) -> AppResult<User> {
        let now = Utc::now();

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (email, full_name, password, role_id, created_at, created_by, updated_at, updated_by, is_deleted)
            VALUES ($1, $2, $3, $4, $5, $6, $5, $6, FALSE)
            RETURNING id
            "#,
        )
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(user.role_id)
        .bind(now)
        .bind(user.created_by)
        .fetch_one(&mut **tx)
        .await?;

        Self::fetch_in(tx, id).await
    }

    async fn update_in(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        changes: &UserChanges,
        actor: Uuid,
    ) -> AppResult<User> {
        let now = Utc::now();

        // Build dynamic update query
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

        add_field!(changes.email, "email");
        add_field!(changes.full_name, "full_name");
        add_field!(changes.password_hash, "password");
        add_field!(changes.role_id, "role_id");

        let query = format!(
            "UPDATE users SET {} WHERE id = ${} AND NOT is_deleted",
            sets.join(", "),
            param_idx
        );

        let mut builder = sqlx::query(&query).bind(now).bind(actor);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(changes.email);
        bind_field!(changes.full_name);
        bind_field!(changes.password_hash);
        bind_field!(changes.role_id);

        let result = builder.bind(id).execute(&mut **tx).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
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
            UPDATE users
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
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for UsersRepository {
    async fn find_active_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "{} WHERE LOWER(u.email) = LOWER($1) AND NOT u.is_deleted",
            USER_SELECT
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!("{} WHERE u.id = $1 AND NOT u.is_deleted", USER_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    async fn email_taken(&self, email: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE LOWER(email) = LOWER($1) AND NOT is_deleted
                  AND ($2::uuid IS NULL OR id != $2)
            )
            "#,
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, description, created_by, updated_by, updated_at FROM roles WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;
        let result = Self::create_in(&mut tx, &user).await;
        finish(tx, result).await
    }

    async fn update(&self, id: Uuid, changes: UserChanges, actor: Uuid) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;
        let result = Self::update_in(&mut tx, id, &changes, actor).await;
        finish(tx, result).await
    }

    async fn soft_delete(&self, id: Uuid, actor: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let result = Self::soft_delete_in(&mut tx, id, actor).await;
        finish(tx, result).await
    }
}
