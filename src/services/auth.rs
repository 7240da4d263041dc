//! Login and registration

use std::sync::Arc;

use crate::{
    auth::{PasswordHasher, TokenCodec},
    error::{AppError, AppResult, AuthError},
    models::user::NewUser,
    repository::UserStore,
};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    codec: TokenCodec,
    default_role: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        codec: TokenCodec,
        default_role: String,
    ) -> Self {
        Self {
            users,
            hasher,
            codec,
            default_role,
        }
    }

    /// Check credentials and issue an access token.
    ///
    /// Unknown email and wrong password fail with the same error.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<String> {
        let user = match self.users.find_active_by_email(email).await? {
            Some(user) if self.hasher.verify(password, &user.password) => user,
            _ => {
                tracing::warn!("Rejected login attempt");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        let token = self.codec.issue(user.id, &user.email, &user.role)?;
        tracing::debug!(user_id = %user.id, "Access token issued");
        Ok(token)
    }

    /// Create an account with the default role, then log it in.
    ///
    /// Nothing is stored when no token could be issued for the new account.
    pub async fn register(
        &self,
        email: &str,
        full_name: Option<String>,
        password: &str,
    ) -> AppResult<String> {
        self.codec.ensure_configured()?;

        if self.users.email_taken(email, None).await? {
            return Err(AppError::DuplicateEmail(email.to_string()));
        }

        let role = self
            .users
            .find_role_by_name(&self.default_role)
            .await?
            .ok_or_else(|| {
                AppError::Configuration(format!("Default role '{}' not found", self.default_role))
            })?;

        let password_hash = self.hasher.hash(password)?;

        let user = self
            .users
            .create(NewUser {
                email: email.to_string(),
                full_name,
                password_hash,
                role_id: role.id,
                created_by: None,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");

        self.login(email, password).await
    }
}
