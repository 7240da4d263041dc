//! Material catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::material::{CreateMaterial, Material, UpdateMaterial},
    AppState,
};

use super::{AdminUser, AuthenticatedUser};

/// Get material by ID
#[utoipa::path(
    get,
    path = "/materials/{id}",
    tag = "materials",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Material ID")
    ),
    responses(
        (status = 200, description = "Material details", body = Material),
        (status = 404, description = "Material not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_material(
    State(state): State<AppState>,
    AuthenticatedUser(_identity): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Material>> {
    let material = state.services.materials.get_material(id).await?;
    Ok(Json(material))
}

/// Create a material
#[utoipa::path(
    post,
    path = "/materials",
    tag = "materials",
    security(("bearer_auth" = [])),
    request_body = CreateMaterial,
    responses(
        (status = 201, description = "Material created", body = Material),
        (status = 400, description = "Invalid input or duplicate title", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_material(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Json(data): Json<CreateMaterial>,
) -> AppResult<(StatusCode, Json<Material>)> {
    let material = state.services.materials.create_material(&identity, data).await?;
    Ok((StatusCode::CREATED, Json(material)))
}

/// Update a material
#[utoipa::path(
    put,
    path = "/materials/{id}",
    tag = "materials",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Material ID")
    ),
    request_body = UpdateMaterial,
    responses(
        (status = 200, description = "Material updated", body = Material),
        (status = 404, description = "Material not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_material(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateMaterial>,
) -> AppResult<Json<Material>> {
    let material = state.services.materials.update_material(&identity, id, data).await?;
    Ok(Json(material))
}

/// Soft-delete a material
#[utoipa::path(
    delete,
    path = "/materials/{id}",
    tag = "materials",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Material ID")
    ),
    responses(
        (status = 204, description = "Material deleted"),
        (status = 404, description = "Material not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_material(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.materials.delete_material(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
