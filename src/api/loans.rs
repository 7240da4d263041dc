//! Loan management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::loan::{CreateLoan, Loan},
    AppState,
};

use super::{AdminUser, AuthenticatedUser};

/// Borrow a material for a user
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 400, description = "Material already on loan or invalid due date", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
        (status = 404, description = "Material or user not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Json(request): Json<CreateLoan>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    let loan = state.services.loans.create_loan(&identity, request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Return a borrowed material
#[utoipa::path(
    put,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan returned", body = Loan),
        (status = 400, description = "Already returned", body = crate::error::ErrorResponse),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(loan_id): Path<Uuid>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.return_loan(&identity, loan_id).await?;
    Ok(Json(loan))
}

/// Get a loan (admin or borrower)
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan", body = Loan),
        (status = 403, description = "Not the borrower", body = crate::error::ErrorResponse),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_loan(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(loan_id): Path<Uuid>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.get_loan(&identity, loan_id).await?;
    Ok(Json(loan))
}

/// List all loans, newest first
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All loans", body = Vec<Loan>),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_loans(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state.services.loans.list_loans(&identity).await?;
    Ok(Json(loans))
}

/// List the loans of one user (admin or self)
#[utoipa::path(
    get,
    path = "/loans/user/{user_id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's loans", body = Vec<Loan>),
        (status = 403, description = "Not the user", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user_loans(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state.services.loans.list_user_loans(&identity, user_id).await?;
    Ok(Json(loans))
}
