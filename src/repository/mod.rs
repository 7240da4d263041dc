//! Repository layer for database operations
//!
//! Services talk to the store through the traits below; the Postgres
//! implementations live in the submodules. Every mutating operation runs in a
//! single transaction that is rolled back before an error is returned.

pub mod loans;
pub mod materials;
pub mod references;
pub mod users;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        loan::{Loan, NewLoan},
        material::{CreateMaterial, Material, UpdateMaterial},
        reference::ReferenceKind,
        role::Role,
        user::{NewUser, User, UserChanges},
    },
};

/// Credential store: user records and the roles they reference
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Non-deleted user by email, case-insensitive
    async fn find_active_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Non-deleted user by id, `NotFound` otherwise
    async fn get_by_id(&self, id: Uuid) -> AppResult<User>;

    /// Whether another non-deleted user already owns `email`
    async fn email_taken(&self, email: &str, exclude_id: Option<Uuid>) -> AppResult<bool>;

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>>;

    async fn create(&self, user: NewUser) -> AppResult<User>;

    async fn update(&self, id: Uuid, changes: UserChanges, actor: Uuid) -> AppResult<User>;

    async fn soft_delete(&self, id: Uuid, actor: Uuid) -> AppResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MaterialStore: Send + Sync {
    /// Non-deleted material by id, `NotFound` otherwise
    async fn get_by_id(&self, id: Uuid) -> AppResult<Material>;

    async fn title_exists(&self, title: &str, exclude_id: Option<Uuid>) -> AppResult<bool>;

    async fn create(&self, data: CreateMaterial, actor: Uuid) -> AppResult<Material>;

    async fn update(&self, id: Uuid, data: UpdateMaterial, actor: Uuid) -> AppResult<Material>;

    async fn soft_delete(&self, id: Uuid, actor: Uuid) -> AppResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// Atomically check availability and insert an ACTIVE loan
    async fn create(&self, loan: NewLoan) -> AppResult<Loan>;

    /// ACTIVE -> RETURNED, patching the row in place
    async fn return_loan(&self, id: Uuid, actor: Uuid) -> AppResult<Loan>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<Loan>;

    async fn list(&self) -> AppResult<Vec<Loan>>;

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<Loan>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Delete a reference row, refusing while other rows point at it
    /// or when its name is one of `required`
    async fn hard_delete_if_unreferenced(
        &self,
        kind: ReferenceKind,
        id: Uuid,
        required: Vec<String>,
    ) -> AppResult<()>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub materials: materials::MaterialsRepository,
    pub loans: loans::LoansRepository,
    pub references: references::ReferencesRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            materials: materials::MaterialsRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            references: references::ReferencesRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Commit on success; roll back on failure before handing the error back
pub(crate) async fn finish<T>(
    tx: Transaction<'_, Postgres>,
    result: AppResult<T>,
) -> AppResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Transaction rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}
