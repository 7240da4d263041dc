//! Reference data deletion endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::reference::{DeleteResponse, ReferenceKind},
    AppState,
};

use super::AdminUser;

async fn delete_reference(
    state: AppState,
    identity: crate::auth::Identity,
    kind: ReferenceKind,
    id: Uuid,
) -> AppResult<Json<DeleteResponse>> {
    let response = state.services.references.delete(&identity, kind, id).await?;
    Ok(Json(response))
}

/// Delete a role nobody holds
#[utoipa::path(
    delete,
    path = "/roles/{id}",
    tag = "references",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role deleted", body = DeleteResponse),
        (status = 400, description = "Role still assigned to users", body = crate::error::ErrorResponse),
        (status = 404, description = "Role not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_role(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    delete_reference(state, identity, ReferenceKind::Role, id).await
}

/// Delete an author with no materials
#[utoipa::path(
    delete,
    path = "/authors/{id}",
    tag = "references",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author deleted", body = DeleteResponse),
        (status = 400, description = "Author still referenced by materials", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    delete_reference(state, identity, ReferenceKind::Author, id).await
}

/// Delete a material type with no materials
#[utoipa::path(
    delete,
    path = "/material-types/{id}",
    tag = "references",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Material type ID")),
    responses(
        (status = 200, description = "Material type deleted", body = DeleteResponse),
        (status = 400, description = "Type still referenced by materials", body = crate::error::ErrorResponse),
        (status = 404, description = "Material type not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_material_type(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    delete_reference(state, identity, ReferenceKind::MaterialType, id).await
}

/// Delete a loan status no loan uses
#[utoipa::path(
    delete,
    path = "/loan-status/{id}",
    tag = "references",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Loan status ID")),
    responses(
        (status = 200, description = "Loan status deleted", body = DeleteResponse),
        (status = 400, description = "Status still used by loans", body = crate::error::ErrorResponse),
        (status = 404, description = "Loan status not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_loan_status(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    delete_reference(state, identity, ReferenceKind::LoanStatus, id).await
}
