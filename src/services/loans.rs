//! Loan lifecycle service: borrow, return and guarded reads

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::Identity,
    error::{AppError, AppResult},
    models::loan::{CreateLoan, Loan, NewLoan},
    repository::LoanStore,
};

#[derive(Clone)]
pub struct LoansService {
    loans: Arc<dyn LoanStore>,
}

impl LoansService {
    pub fn new(loans: Arc<dyn LoanStore>) -> Self {
        Self { loans }
    }

    /// Borrow a material for a user (admin only)
    pub async fn create_loan(&self, identity: &Identity, request: CreateLoan) -> AppResult<Loan> {
        identity.require_admin()?;

        if request.expected_return_date <= Utc::now() {
            return Err(AppError::Validation(
                "expected_return_date must be in the future".to_string(),
            ));
        }

        let loan = self
            .loans
            .create(NewLoan {
                material_id: request.material_id,
                user_id: request.user_id,
                expected_return_date: request.expected_return_date,
                actor: identity.id,
            })
            .await?;

        tracing::info!(
            loan_id = %loan.id,
            material_id = %loan.material_id,
            user_id = %loan.user_id,
            actor = %identity.id,
            "Loan created"
        );
        Ok(loan)
    }

    /// Return a borrowed material (admin only). A second return always fails.
    pub async fn return_loan(&self, identity: &Identity, loan_id: Uuid) -> AppResult<Loan> {
        identity.require_admin()?;

        let loan = self.loans.return_loan(loan_id, identity.id).await?;
        tracing::info!(
            loan_id = %loan.id,
            material_id = %loan.material_id,
            actor = %identity.id,
            "Loan returned"
        );
        Ok(loan)
    }

    pub async fn get_loan(&self, identity: &Identity, loan_id: Uuid) -> AppResult<Loan> {
        let loan = self.loans.get_by_id(loan_id).await?;
        identity.require_self_or_admin(loan.user_id)?;
        Ok(loan)
    }

    pub async fn list_loans(&self, identity: &Identity) -> AppResult<Vec<Loan>> {
        identity.require_admin()?;
        self.loans.list().await
    }

    pub async fn list_user_loans(&self, identity: &Identity, user_id: Uuid) -> AppResult<Vec<Loan>> {
        identity.require_self_or_admin(user_id)?;
        self.loans.list_by_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::loan::{LoanRow, LoanState},
        repository::MockLoanStore,
    };
    use chrono::Duration;

    fn identity(role: &str) -> Identity {
        let now = Utc::now();
        Identity {
            id: Uuid::new_v4(),
            email: "desk@example.com".to_string(),
            role: role.to_string(),
            issued_at: now,
            expires_at: now + Duration::minutes(30),
        }
    }

    fn active_loan(material_id: Uuid, user_id: Uuid, actor: Uuid) -> Loan {
        let now = Utc::now();
        Loan::from_row(
            LoanRow {
                id: Uuid::new_v4(),
                material_id,
                user_id,
                status_id: Uuid::new_v4(),
                status: "borrowed".to_string(),
                loan_date: now,
                expected_return_date: now + Duration::days(14),
                actual_return_date: None,
                created_by: Some(actor),
                updated_by: Some(actor),
                updated_at: now,
            },
            now,
        )
    }

    fn request(material_id: Uuid, user_id: Uuid) -> CreateLoan {
        CreateLoan {
            material_id,
            user_id,
            expected_return_date: Utc::now() + Duration::days(14),
        }
    }

    #[tokio::test]
    async fn test_create_loan_stamps_actor() {
        let admin = identity("admin");
        let actor = admin.id;
        let (material, reader) = (Uuid::new_v4(), Uuid::new_v4());

        let mut store = MockLoanStore::new();
        store
            .expect_create()
            .withf(move |new: &NewLoan| {
                new.material_id == material && new.user_id == reader && new.actor == actor
            })
            .times(1)
            .returning(|new| Ok(active_loan(new.material_id, new.user_id, new.actor)));
        let service = LoansService::new(Arc::new(store));

        let loan = service.create_loan(&admin, request(material, reader)).await.unwrap();
        assert_eq!(loan.state, LoanState::Active);
        assert_eq!(loan.created_by, Some(actor));
        assert_eq!(loan.updated_by, Some(actor));
    }

    #[tokio::test]
    async fn test_create_loan_requires_admin() {
        let mut store = MockLoanStore::new();
        store.expect_create().never();
        let service = LoansService::new(Arc::new(store));

        let err = service
            .create_loan(&identity("client"), request(Uuid::new_v4(), Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_past_due_date_is_rejected() {
        let mut store = MockLoanStore::new();
        store.expect_create().never();
        let service = LoansService::new(Arc::new(store));

        let mut past = request(Uuid::new_v4(), Uuid::new_v4());
        past.expected_return_date = Utc::now() - Duration::days(1);

        let err = service.create_loan(&identity("admin"), past).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_soft_deleted_material_is_not_found() {
        let mut store = MockLoanStore::new();
        store.expect_create().returning(|new| {
            Err(AppError::NotFound(format!(
                "Material with id {} not found",
                new.material_id
            )))
        });
        let service = LoansService::new(Arc::new(store));

        let err = service
            .create_loan(&identity("admin"), request(Uuid::new_v4(), Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.status_and_code().0, axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_material_on_loan_is_unavailable() {
        let material = Uuid::new_v4();
        let mut store = MockLoanStore::new();
        store
            .expect_create()
            .returning(|new| Err(AppError::MaterialUnavailable(new.material_id)));
        let service = LoansService::new(Arc::new(store));

        let err = service
            .create_loan(&identity("admin"), request(material, Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MaterialUnavailable(id) if id == material));
    }

    #[tokio::test]
    async fn test_second_return_fails_identically() {
        let admin = identity("admin");
        let loan = active_loan(Uuid::new_v4(), Uuid::new_v4(), admin.id);
        let loan_id = loan.id;

        let mut returned = loan.clone();
        returned.mark_returned(Uuid::new_v4(), admin.id, Utc::now()).unwrap();

        let mut store = MockLoanStore::new();
        let mut calls = 0;
        store.expect_return_loan().times(3).returning(move |id, _| {
            calls += 1;
            if calls == 1 {
                Ok(returned.clone())
            } else {
                Err(AppError::AlreadyReturned(id))
            }
        });
        let service = LoansService::new(Arc::new(store));

        let first = service.return_loan(&admin, loan_id).await.unwrap();
        assert_eq!(first.state, LoanState::Returned);
        assert_eq!(first.material_id, loan.material_id);

        let second = service.return_loan(&admin, loan_id).await.unwrap_err();
        let third = service.return_loan(&admin, loan_id).await.unwrap_err();
        assert!(matches!(second, AppError::AlreadyReturned(id) if id == loan_id));
        assert_eq!(second.to_string(), third.to_string());
    }

    #[tokio::test]
    async fn test_get_loan_owner_or_admin() {
        let owner = identity("client");
        let loan = active_loan(Uuid::new_v4(), owner.id, Uuid::new_v4());
        let loan_id = loan.id;

        let mut store = MockLoanStore::new();
        store
            .expect_get_by_id()
            .returning(move |_| Ok(loan.clone()));
        let service = LoansService::new(Arc::new(store));

        assert!(service.get_loan(&owner, loan_id).await.is_ok());
        assert!(service.get_loan(&identity("admin"), loan_id).await.is_ok());
        assert!(matches!(
            service.get_loan(&identity("client"), loan_id).await,
            Err(AppError::Authorization(_))
        ));
    }

    #[tokio::test]
    async fn test_list_rules() {
        let reader = identity("client");
        let reader_id = reader.id;

        let mut store = MockLoanStore::new();
        store.expect_list().never();
        store
            .expect_list_by_user()
            .withf(move |id: &Uuid| *id == reader_id)
            .times(1)
            .returning(|_| Ok(Vec::new()));
        let service = LoansService::new(Arc::new(store));

        assert!(matches!(service.list_loans(&reader).await, Err(AppError::Authorization(_))));
        assert!(service.list_user_loans(&reader, reader_id).await.unwrap().is_empty());
        assert!(matches!(
            service.list_user_loans(&reader, Uuid::new_v4()).await,
            Err(AppError::Authorization(_))
        ));
    }
}
