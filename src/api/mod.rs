//! API handlers for Biblio REST endpoints

pub mod auth;
pub mod health;
pub mod loans;
pub mod materials;
pub mod openapi;
pub mod references;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{
    auth::{require_admin, require_authenticated, Identity},
    error::{AppError, AuthError},
    AppState,
};

/// Raw `Authorization` header; a value that is not valid UTF-8 cannot be a bearer credential
fn authorization_header(parts: &Parts) -> Result<Option<&str>, AppError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AppError::from(AuthError::MalformedScheme)))
        .transpose()
}

/// Extractor for the caller proven by a bearer token
pub struct AuthenticatedUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = authorization_header(parts)?;
        let identity = require_authenticated(&state.services.sessions, header)?;
        Ok(AuthenticatedUser(identity))
    }
}

/// Extractor for an authenticated administrator
pub struct AdminUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = authorization_header(parts)?;
        let identity = require_admin(&state.services.sessions, header)?;
        Ok(AdminUser(identity))
    }
}
