//! User management service

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{Identity, PasswordHasher},
    error::{AppError, AppResult},
    models::user::{CreateUser, NewUser, UpdateUser, User, UserChanges},
    repository::UserStore,
};

#[derive(Clone)]
pub struct UsersService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    default_role: String,
}

impl UsersService {
    pub fn new(users: Arc<dyn UserStore>, hasher: PasswordHasher, default_role: String) -> Self {
        Self {
            users,
            hasher,
            default_role,
        }
    }

    /// Create a user on behalf of an administrator, with any role
    pub async fn create_user(&self, identity: &Identity, data: CreateUser) -> AppResult<User> {
        identity.require_admin()?;
        data.validate()?;

        if self.users.email_taken(&data.email, None).await? {
            return Err(AppError::DuplicateEmail(data.email));
        }

        let role_id = match data.role_id {
            Some(role_id) => role_id,
            None => {
                self.users
                    .find_role_by_name(&self.default_role)
                    .await?
                    .ok_or_else(|| {
                        AppError::Configuration(format!(
                            "Default role '{}' not found",
                            self.default_role
                        ))
                    })?
                    .id
            }
        };

        let password_hash = self.hasher.hash(&data.password)?;

        let user = self
            .users
            .create(NewUser {
                email: data.email,
                full_name: data.full_name,
                password_hash,
                role_id,
                created_by: Some(identity.id),
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, actor = %identity.id, "User created");
        Ok(user)
    }

    pub async fn get_user(&self, identity: &Identity, id: Uuid) -> AppResult<User> {
        identity.require_self_or_admin(id)?;
        self.users.get_by_id(id).await
    }

    /// Apply the supplied fields only. Role changes are reserved to administrators.
    pub async fn update_user(
        &self,
        identity: &Identity,
        id: Uuid,
        data: UpdateUser,
    ) -> AppResult<User> {
        identity.require_self_or_admin(id)?;
        if data.role_id.is_some() && !identity.is_admin() {
            return Err(AppError::Authorization(
                "Only administrators may change a user's role".to_string(),
            ));
        }
        data.validate()?;
        if data.is_empty() {
            return Err(AppError::Validation("No fields to update".to_string()));
        }

        if let Some(ref email) = data.email {
            if self.users.email_taken(email, Some(id)).await? {
                return Err(AppError::DuplicateEmail(email.clone()));
            }
        }

        let password_hash = data
            .password
            .as_deref()
            .map(|p| self.hasher.hash(p))
            .transpose()?;

        let changes = UserChanges {
            email: data.email,
            full_name: data.full_name,
            password_hash,
            role_id: data.role_id,
        };

        let user = self.users.update(id, changes, identity.id).await?;
        tracing::info!(user_id = %user.id, actor = %identity.id, "User updated");
        Ok(user)
    }

    pub async fn delete_user(&self, identity: &Identity, id: Uuid) -> AppResult<()> {
        identity.require_admin()?;
        self.users.soft_delete(id, identity.id).await?;
        tracing::info!(user_id = %id, actor = %identity.id, "User deleted");
        Ok(())
    }
}
