//! Per-request identity resolution and authorization guards

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::token::{Claims, TokenCodec};
use crate::{
    error::{AppError, AppResult, AuthError},
    models::role::ADMIN_ROLE,
};

/// Identity proven by a verified bearer token. Lives for one request only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    /// Require administrator role
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Admin role required".to_string()))
        }
    }

    /// Require administrator role or ownership of the resource
    pub fn require_self_or_admin(&self, owner_id: Uuid) -> AppResult<()> {
        if self.is_admin() || self.id == owner_id {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Only the owner or an administrator may access this resource".to_string(),
            ))
        }
    }
}

impl TryFrom<Claims> for Identity {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let exp = claims.exp.ok_or(AuthError::ExpiredToken)?;
        let issued_at = DateTime::from_timestamp(claims.iat, 0)
            .ok_or_else(|| AuthError::InvalidToken("issued-at out of range".into()))?;
        let expires_at =
            DateTime::from_timestamp(exp, 0).ok_or(AuthError::ExpiredToken)?;

        Ok(Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
            issued_at,
            expires_at,
        })
    }
}

/// Turns a raw `Authorization` header into an [`Identity`]
#[derive(Debug, Clone)]
pub struct SessionResolver {
    codec: TokenCodec,
}

impl SessionResolver {
    pub fn new(codec: TokenCodec) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Resolve the caller from the raw header value. No I/O, no side effects.
    pub fn resolve_identity(&self, raw_header: Option<&str>) -> Result<Identity, AuthError> {
        let raw = raw_header
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(AuthError::MissingCredentials)?;

        let (scheme, token) = raw
            .split_once(char::is_whitespace)
            .ok_or(AuthError::MalformedScheme)?;
        let token = token.trim();
        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            return Err(AuthError::MalformedScheme);
        }

        let claims = self.codec.verify(token)?;
        Identity::try_from(claims)
    }
}

/// Guard: the request carries a valid bearer token
pub fn require_authenticated(
    resolver: &SessionResolver,
    raw_header: Option<&str>,
) -> AppResult<Identity> {
    resolver.resolve_identity(raw_header).map_err(AppError::from)
}

/// Guard: the request carries a valid bearer token for an administrator
pub fn require_admin(resolver: &SessionResolver, raw_header: Option<&str>) -> AppResult<Identity> {
    let identity = require_authenticated(resolver, raw_header)?;
    identity.require_admin()?;
    Ok(identity)
}
