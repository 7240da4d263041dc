//! Material model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Material record (book, magazine, newspaper...)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Material {
    pub id: Uuid,
    pub title: String,
    pub author_id: Uuid,
    pub type_id: Uuid,
    pub is_deleted: bool,
    pub date_added: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// Create material request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMaterial {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    pub author_id: Uuid,
    pub type_id: Uuid,
}

/// Update material request. Only supplied fields change.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateMaterial {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    pub author_id: Option<Uuid>,
    pub type_id: Option<Uuid>,
}
