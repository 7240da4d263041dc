//! Loans repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use super::{finish, LoanStore};
use crate::{
    error::{AppError, AppResult},
    models::loan::{BorrowSnapshot, Loan, LoanRow, LoanState, NewLoan},
};

/// Partial unique index allowing a single unreturned loan per material
const ACTIVE_LOAN_INDEX: &str = "loans_one_active_per_material";

const LOAN_SELECT: &str = r#"
    SELECT l.id, l.material_id, l.user_id, l.status_id, s.name AS status,
           l.loan_date, l.expected_return_date, l.actual_return_date,
           l.created_by, l.updated_by, l.updated_at
    FROM loans l
    JOIN loan_status s ON s.id = l.status_id
"#;

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn status_id(tx: &mut Transaction<'_, Postgres>, state: LoanState) -> AppResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM loan_status WHERE name = $1")
            .bind(state.status_name())
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| {
                AppError::Configuration(format!(
                    "Loan status '{}' is missing from loan_status",
                    state.status_name()
                ))
            })
    }

    async fn fetch_in(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> AppResult<Loan> {
        let row = sqlx::query_as::<_, LoanRow>(&format!("{} WHERE l.id = $1", LOAN_SELECT))
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))?;

        Ok(Loan::from(row))
    }

    async fn create_in(tx: &mut Transaction<'_, Postgres>, loan: &NewLoan) -> AppResult<Loan> {
        // Concurrent borrows of the same material queue on this lock
        let material_deleted: Option<bool> =
            sqlx::query_scalar("SELECT is_deleted FROM materials WHERE id = $1 FOR UPDATE")
                .bind(loan.material_id)
                .fetch_optional(&mut **tx)
                .await?;

        let user_exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND NOT is_deleted)",
        )
        .bind(loan.user_id)
        .fetch_one(&mut **tx)
        .await?;

        let has_active_loan: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE material_id = $1 AND actual_return_date IS NULL)",
        )
        .bind(loan.material_id)
        .fetch_one(&mut **tx)
        .await?;

        BorrowSnapshot {
            material_deleted,
            user_exists,
            has_active_loan,
        }
        .ensure_borrowable(loan.material_id, loan.user_id)?;

        let status_id = Self::status_id(tx, LoanState::Active).await?;
        let now = Utc::now();

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO loans (material_id, user_id, loan_date, expected_return_date, status_id,
                               created_by, updated_by, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6, $3)
            RETURNING id
            "#,
        )
        .bind(loan.material_id)
        .bind(loan.user_id)
        .bind(now)
        .bind(loan.expected_return_date)
        .bind(status_id)
        .bind(loan.actor)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| active_loan_conflict(e, loan.material_id))?;

        Self::fetch_in(tx, id).await
    }

    async fn return_in(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        actor: Uuid,
    ) -> AppResult<Loan> {
        let row = sqlx::query_as::<_, LoanRow>(&format!(
            "{} WHERE l.id = $1 FOR UPDATE OF l",
            LOAN_SELECT
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))?;

        let now = Utc::now();
        let mut loan = Loan::from_row(row, now);
        if !loan.is_active() {
            return Err(AppError::AlreadyReturned(loan.id));
        }

        let returned_status = Self::status_id(tx, LoanState::Returned).await?;
        loan.mark_returned(returned_status, actor, now)?;

        sqlx::query(
            r#"
            UPDATE loans
            SET status_id = $1, actual_return_date = $2, updated_by = $3, updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(loan.status_id)
        .bind(loan.actual_return_date)
        .bind(loan.updated_by)
        .bind(loan.updated_at)
        .bind(loan.id)
        .execute(&mut **tx)
        .await?;

        Ok(loan)
    }
}

/// A lost race on the active-loan index means the material is taken
fn active_loan_conflict(e: sqlx::Error, material_id: Uuid) -> AppError {
    let hit = e
        .as_database_error()
        .and_then(|db| db.constraint())
        .map(|name| name == ACTIVE_LOAN_INDEX)
        .unwrap_or(false);

    if hit {
        tracing::info!("Concurrent borrow of material {} rejected by index", material_id);
        AppError::MaterialUnavailable(material_id)
    } else {
        AppError::from(e)
    }
}

#[async_trait]
impl LoanStore for LoansRepository {
    async fn create(&self, loan: NewLoan) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;
        let result = Self::create_in(&mut tx, &loan).await;
        finish(tx, result).await
    }

    async fn return_loan(&self, id: Uuid, actor: Uuid) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;
        let result = Self::return_in(&mut tx, id, actor).await;
        finish(tx, result).await
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Loan> {
        let row = sqlx::query_as::<_, LoanRow>(&format!("{} WHERE l.id = $1", LOAN_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))?;

        Ok(Loan::from(row))
    }

    async fn list(&self) -> AppResult<Vec<Loan>> {
        let rows = sqlx::query_as::<_, LoanRow>(&format!(
            "{} ORDER BY l.loan_date DESC",
            LOAN_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();
        Ok(rows.into_iter().map(|row| Loan::from_row(row, now)).collect())
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<Loan>> {
        let rows = sqlx::query_as::<_, LoanRow>(&format!(
            "{} WHERE l.user_id = $1 ORDER BY l.loan_date DESC",
            LOAN_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();
        Ok(rows.into_iter().map(|row| Loan::from_row(row, now)).collect())
    }
}
