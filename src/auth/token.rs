//! Signed access tokens (JWT, single shared-secret HMAC algorithm)

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::AuthConfig, error::AuthError};

/// Longest accepted access token lifetime
const MAX_TTL_DAYS: i64 = 366;

/// Claim set embedded in every access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id
    pub sub: Uuid,
    pub email: String,
    /// Role name at issuance
    pub role: String,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch); tokens without it are rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    /// Build claims issued at `now`, expiring after `ttl`
    pub fn issued_at(
        user_id: Uuid,
        email: impl Into<String>,
        role: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: user_id,
            email: email.into(),
            role: role.into(),
            iat: now.timestamp(),
            // An unrepresentable expiry leaves `exp` unset, which verification rejects
            exp: now.checked_add_signed(ttl).map(|at| at.timestamp()),
        }
    }
}

#[derive(Clone)]
struct SigningKeys {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

/// Signs and verifies claim sets.
///
/// A codec built from incomplete settings still exists; it fails every call
/// with [`AuthError::Misconfigured`].
#[derive(Clone)]
pub struct TokenCodec {
    keys: Result<SigningKeys, String>,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.keys.as_ref().map(|k| k.algorithm))
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: Option<&str>, algorithm: Option<&str>, ttl: Duration) -> Self {
        Self {
            keys: check_ttl(ttl).and_then(|_| build_keys(secret, algorithm)),
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        let minutes = config.access_token_expire_minutes;
        match Duration::try_minutes(minutes) {
            Some(ttl) => Self::new(config.jwt_secret.as_deref(), config.jwt_algorithm.as_deref(), ttl),
            None => Self {
                keys: Err(format!("Access token lifetime of {} minutes is out of range", minutes)),
                ttl: Duration::zero(),
            },
        }
    }

    pub fn is_configured(&self) -> bool {
        self.keys.is_ok()
    }

    /// Fail with the misconfiguration reason when no token can be signed
    pub fn ensure_configured(&self) -> Result<(), AuthError> {
        self.keys().map(|_| ())
    }

    /// Access token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a fresh token for a user, valid for the configured lifetime
    pub fn issue(&self, user_id: Uuid, email: &str, role: &str) -> Result<String, AuthError> {
        let claims = Claims::issued_at(user_id, email, role, Utc::now(), self.ttl);
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        let keys = self.keys()?;
        encode(&Header::new(keys.algorithm), claims, &keys.encoding)
            .map_err(|e| AuthError::Misconfigured(format!("Failed to sign token: {}", e)))
    }

    /// Verify signature and expiry, returning the embedded claims
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let keys = self.keys()?;
        let data = decode::<Claims>(token, &keys.decoding, &keys.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                ErrorKind::MissingRequiredClaim(claim) if claim == "exp" => AuthError::ExpiredToken,
                ErrorKind::InvalidSignature => AuthError::InvalidToken("signature mismatch".into()),
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        // Expiry is re-checked here regardless of what the decoder enforced
        match data.claims.exp {
            Some(exp) if exp > Utc::now().timestamp() => Ok(data.claims),
            _ => Err(AuthError::ExpiredToken),
        }
    }

    fn keys(&self) -> Result<&SigningKeys, AuthError> {
        self.keys
            .as_ref()
            .map_err(|msg| AuthError::Misconfigured(msg.clone()))
    }
}

/// A lifetime must be positive and at most [`MAX_TTL_DAYS`]
fn check_ttl(ttl: Duration) -> Result<(), String> {
    if ttl <= Duration::zero() {
        return Err(format!(
            "Access token lifetime must be positive, got {} minutes",
            ttl.num_minutes()
        ));
    }
    if ttl > Duration::days(MAX_TTL_DAYS) {
        return Err(format!(
            "Access token lifetime of {} minutes exceeds {} days",
            ttl.num_minutes(),
            MAX_TTL_DAYS
        ));
    }
    Ok(())
}

fn build_keys(secret: Option<&str>, algorithm: Option<&str>) -> Result<SigningKeys, String> {
    let secret = secret
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "SECRET_KEY or ALGORITHM not set".to_string())?;
    let name = algorithm
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "SECRET_KEY or ALGORITHM not set".to_string())?;

    let algorithm = Algorithm::from_str(name)
        .map_err(|_| format!("Unknown signing algorithm '{}'", name))?;
    if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
        return Err(format!(
            "Signing algorithm '{}' is not a shared-secret algorithm",
            name
        ));
    }

    let mut validation = Validation::new(algorithm);
    validation.leeway = 0;
    validation.validate_exp = true;

    Ok(SigningKeys {
        algorithm,
        encoding: EncodingKey::from_secret(secret.as_bytes()),
        decoding: DecodingKey::from_secret(secret.as_bytes()),
        validation,
    })
}
