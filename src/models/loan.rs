//! Loan (borrow) model and lifecycle rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Lifecycle state of a loan. `Returned` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoanState {
    Active,
    Returned,
}

impl LoanState {
    /// Name of the `loan_status` row backing this state
    pub fn status_name(&self) -> &'static str {
        match self {
            LoanState::Active => "borrowed",
            LoanState::Returned => "returned",
        }
    }

    pub fn from_status_name(name: &str) -> Option<Self> {
        match name {
            "borrowed" => Some(LoanState::Active),
            "returned" => Some(LoanState::Returned),
            _ => None,
        }
    }
}

/// Internal row structure for loan queries (joined with the status name)
#[derive(Debug, Clone, FromRow)]
pub struct LoanRow {
    pub id: Uuid,
    pub material_id: Uuid,
    pub user_id: Uuid,
    pub status_id: Uuid,
    pub status: String,
    pub loan_date: DateTime<Utc>,
    pub expected_return_date: DateTime<Utc>,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// Loan as exposed by the API
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Loan {
    pub id: Uuid,
    pub material_id: Uuid,
    pub user_id: Uuid,
    pub status_id: Uuid,
    pub state: LoanState,
    pub loan_date: DateTime<Utc>,
    pub expected_return_date: DateTime<Utc>,
    pub actual_return_date: Option<DateTime<Utc>>,
    /// Derived: active and past its expected return date
    pub is_overdue: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    pub fn from_row(row: LoanRow, now: DateTime<Utc>) -> Self {
        // Rows carrying a custom status fall back to the return date
        let state = LoanState::from_status_name(&row.status).unwrap_or(
            if row.actual_return_date.is_some() {
                LoanState::Returned
            } else {
                LoanState::Active
            },
        );

        Self {
            id: row.id,
            material_id: row.material_id,
            user_id: row.user_id,
            status_id: row.status_id,
            state,
            loan_date: row.loan_date,
            expected_return_date: row.expected_return_date,
            actual_return_date: row.actual_return_date,
            is_overdue: state == LoanState::Active && row.expected_return_date < now,
            created_by: row.created_by,
            updated_by: row.updated_by,
            updated_at: row.updated_at,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == LoanState::Active
    }

    /// ACTIVE -> RETURNED. Patches this loan in place; every other field is kept.
    pub fn mark_returned(
        &mut self,
        returned_status_id: Uuid,
        actor: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if !self.is_active() {
            return Err(AppError::AlreadyReturned(self.id));
        }

        self.state = LoanState::Returned;
        self.status_id = returned_status_id;
        self.actual_return_date = Some(now);
        self.is_overdue = false;
        self.updated_by = Some(actor);
        self.updated_at = now;
        Ok(())
    }
}

impl From<LoanRow> for Loan {
    fn from(row: LoanRow) -> Self {
        Loan::from_row(row, Utc::now())
    }
}

/// What the store observed about a borrow request under lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowSnapshot {
    /// `None` when the material row does not exist
    pub material_deleted: Option<bool>,
    pub user_exists: bool,
    pub has_active_loan: bool,
}

impl BorrowSnapshot {
    /// Decide whether a new ACTIVE loan may be created
    pub fn ensure_borrowable(&self, material_id: Uuid, user_id: Uuid) -> AppResult<()> {
        match self.material_deleted {
            None | Some(true) => {
                return Err(AppError::NotFound(format!(
                    "Material with id {} not found",
                    material_id
                )))
            }
            Some(false) => {}
        }
        if !self.user_exists {
            return Err(AppError::NotFound(format!("User with id {} not found", user_id)));
        }
        if self.has_active_loan {
            return Err(AppError::MaterialUnavailable(material_id));
        }
        Ok(())
    }
}

/// Create loan request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateLoan {
    pub material_id: Uuid,
    pub user_id: Uuid,
    pub expected_return_date: DateTime<Utc>,
}

/// Create loan command, actor already resolved
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoan {
    pub material_id: Uuid,
    pub user_id: Uuid,
    pub expected_return_date: DateTime<Utc>,
    pub actor: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn row(status: &str, returned: Option<DateTime<Utc>>, due: DateTime<Utc>) -> LoanRow {
        let now = Utc::now();
        LoanRow {
            id: Uuid::new_v4(),
            material_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            status_id: Uuid::new_v4(),
            status: status.to_string(),
            loan_date: now - Duration::days(3),
            expected_return_date: due,
            actual_return_date: returned,
            created_by: None,
            updated_by: None,
            updated_at: now,
        }
    }

    #[test]
    fn test_state_names() {
        for state in [LoanState::Active, LoanState::Returned] {
            assert_eq!(LoanState::from_status_name(state.status_name()), Some(state));
        }
        assert_eq!(LoanState::from_status_name("overdue"), None);
    }

    #[test]
    fn test_overdue_is_derived() {
        let now = Utc::now();
        let late = Loan::from_row(row("borrowed", None, now - Duration::days(1)), now);
        assert!(late.is_active());
        assert!(late.is_overdue);

        let on_time = Loan::from_row(row("borrowed", None, now + Duration::days(1)), now);
        assert!(!on_time.is_overdue);

        let returned_late = Loan::from_row(
            row("returned", Some(now), now - Duration::days(1)),
            now,
        );
        assert_eq!(returned_late.state, LoanState::Returned);
        assert!(!returned_late.is_overdue);
    }

    #[test]
    fn test_unknown_status_falls_back_to_return_date() {
        let now = Utc::now();
        let loan = Loan::from_row(row("lost", Some(now), now), now);
        assert_eq!(loan.state, LoanState::Returned);
        let loan = Loan::from_row(row("lost", None, now), now);
        assert_eq!(loan.state, LoanState::Active);
    }

    #[test]
    fn test_mark_returned_patches_in_place() {
        let now = Utc::now();
        let mut loan = Loan::from_row(row("borrowed", None, now + Duration::days(7)), now);
        let before = loan.clone();
        let actor = Uuid::new_v4();
        let returned_status = Uuid::new_v4();

        loan.mark_returned(returned_status, actor, now).unwrap();

        assert_eq!(loan.state, LoanState::Returned);
        assert_eq!(loan.actual_return_date, Some(now));
        assert_eq!(loan.updated_by, Some(actor));
        assert_eq!(loan.status_id, returned_status);
        assert_eq!(loan.material_id, before.material_id);
        assert_eq!(loan.user_id, before.user_id);
        assert_eq!(loan.loan_date, before.loan_date);
        assert_eq!(loan.expected_return_date, before.expected_return_date);
    }

    #[test]
    fn test_return_is_terminal() {
        let now = Utc::now();
        let mut loan = Loan::from_row(row("borrowed", None, now), now);
        loan.mark_returned(Uuid::new_v4(), Uuid::new_v4(), now).unwrap();
        let after_first = loan.clone();

        for _ in 0..2 {
            let err = loan
                .mark_returned(Uuid::new_v4(), Uuid::new_v4(), now + Duration::hours(1))
                .unwrap_err();
            assert!(matches!(err, AppError::AlreadyReturned(id) if id == loan.id));
            assert_eq!(loan, after_first);
        }
    }

    #[test]
    fn test_borrow_snapshot_rules() {
        let material = Uuid::new_v4();
        let user = Uuid::new_v4();
        let ok = BorrowSnapshot {
            material_deleted: Some(false),
            user_exists: true,
            has_active_loan: false,
        };
        assert!(ok.ensure_borrowable(material, user).is_ok());

        let missing = BorrowSnapshot { material_deleted: None, ..ok };
        assert!(matches!(missing.ensure_borrowable(material, user), Err(AppError::NotFound(_))));

        let deleted = BorrowSnapshot { material_deleted: Some(true), ..ok };
        assert!(matches!(deleted.ensure_borrowable(material, user), Err(AppError::NotFound(_))));

        let no_user = BorrowSnapshot { user_exists: false, ..ok };
        assert!(matches!(no_user.ensure_borrowable(material, user), Err(AppError::NotFound(_))));

        let taken = BorrowSnapshot { has_active_loan: true, ..ok };
        assert!(matches!(
            taken.ensure_borrowable(material, user),
            Err(AppError::MaterialUnavailable(id)) if id == material
        ));
    }
}
