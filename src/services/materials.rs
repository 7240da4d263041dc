//! Material catalog service

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::Identity,
    error::{AppError, AppResult},
    models::material::{CreateMaterial, Material, UpdateMaterial},
    repository::MaterialStore,
};

#[derive(Clone)]
pub struct MaterialsService {
    materials: Arc<dyn MaterialStore>,
}

impl MaterialsService {
    pub fn new(materials: Arc<dyn MaterialStore>) -> Self {
        Self { materials }
    }

    pub async fn get_material(&self, id: Uuid) -> AppResult<Material> {
        self.materials.get_by_id(id).await
    }

    pub async fn create_material(
        &self,
        identity: &Identity,
        data: CreateMaterial,
    ) -> AppResult<Material> {
        identity.require_admin()?;
        data.validate()?;

        if self.materials.title_exists(&data.title, None).await? {
            return Err(AppError::Conflict(format!(
                "Material with title '{}' already exists",
                data.title
            )));
        }

        let material = self.materials.create(data, identity.id).await?;
        tracing::info!(material_id = %material.id, actor = %identity.id, "Material created");
        Ok(material)
    }

    pub async fn update_material(
        &self,
        identity: &Identity,
        id: Uuid,
        data: UpdateMaterial,
    ) -> AppResult<Material> {
        identity.require_admin()?;
        data.validate()?;

        if let Some(ref title) = data.title {
            if self.materials.title_exists(title, Some(id)).await? {
                return Err(AppError::Conflict(format!(
                    "Material with title '{}' already exists",
                    title
                )));
            }
        }

        self.materials.update(id, data, identity.id).await
    }

    pub async fn delete_material(&self, identity: &Identity, id: Uuid) -> AppResult<()> {
        identity.require_admin()?;
        self.materials.soft_delete(id, identity.id).await?;
        tracing::info!(material_id = %id, actor = %identity.id, "Material deleted");
        Ok(())
    }
}
