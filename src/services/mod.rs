//! Business logic services

pub mod auth;
pub mod loans;
pub mod materials;
pub mod references;
pub mod users;

use std::sync::Arc;

use crate::{
    auth::{PasswordHasher, SessionResolver, TokenCodec},
    config::AuthConfig,
    repository::{LoanStore, MaterialStore, ReferenceStore, Repository, UserStore},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub sessions: SessionResolver,
    pub auth: auth::AuthService,
    pub users: users::UsersService,
    pub materials: materials::MaterialsService,
    pub loans: loans::LoansService,
    pub references: references::ReferencesService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: &AuthConfig) -> Self {
        let codec = TokenCodec::from_config(auth_config);
        let hasher = PasswordHasher::new();

        let users: Arc<dyn UserStore> = Arc::new(repository.users);
        let materials: Arc<dyn MaterialStore> = Arc::new(repository.materials);
        let loans: Arc<dyn LoanStore> = Arc::new(repository.loans);
        let references: Arc<dyn ReferenceStore> = Arc::new(repository.references);

        Self {
            sessions: SessionResolver::new(codec.clone()),
            auth: auth::AuthService::new(
                users.clone(),
                hasher.clone(),
                codec,
                auth_config.default_role.clone(),
            ),
            users: users::UsersService::new(users, hasher, auth_config.default_role.clone()),
            materials: materials::MaterialsService::new(materials),
            loans: loans::LoansService::new(loans),
            references: references::ReferencesService::new(
                references,
                auth_config.default_role.clone(),
            ),
        }
    }
}
