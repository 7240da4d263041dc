//! Deletion of reference data (roles, authors, material types, loan statuses)

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    auth::Identity,
    error::AppResult,
    models::{
        loan::LoanState,
        reference::{DeleteResponse, ReferenceKind},
        role::ADMIN_ROLE,
    },
    repository::ReferenceStore,
};

#[derive(Clone)]
pub struct ReferencesService {
    references: Arc<dyn ReferenceStore>,
    default_role: String,
}

impl ReferencesService {
    pub fn new(references: Arc<dyn ReferenceStore>, default_role: String) -> Self {
        Self {
            references,
            default_role,
        }
    }

    /// Names of rows the server looks up by name and cannot run without
    fn required_names(&self, kind: ReferenceKind) -> Vec<String> {
        match kind {
            ReferenceKind::Role => vec![ADMIN_ROLE.to_string(), self.default_role.clone()],
            ReferenceKind::LoanStatus => [LoanState::Active, LoanState::Returned]
                .iter()
                .map(|state| state.status_name().to_string())
                .collect(),
            ReferenceKind::Author | ReferenceKind::MaterialType => Vec::new(),
        }
    }

    /// Hard delete, refused while any row still references the entity
    /// or while the server depends on it by name
    pub async fn delete(
        &self,
        identity: &Identity,
        kind: ReferenceKind,
        id: Uuid,
    ) -> AppResult<DeleteResponse> {
        identity.require_admin()?;
        self.references
            .hard_delete_if_unreferenced(kind, id, self.required_names(kind))
            .await?;

        tracing::info!(kind = kind.label(), id = %id, actor = %identity.id, "Reference deleted");
        Ok(DeleteResponse {
            message: format!("{} deleted successfully", kind.display_name()),
        })
    }
}
