//! Locally-issued client tokens.
//!
//! HS256 JWTs signed with the configured shared secret, carrying the
//! user context as a claim. Minting lives here too so the `cli-token`
//! companion binary and the tests share one definition of the claims.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{AuthError, UserContext};

pub const DEFAULT_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize, Deserialize)]
pub struct ClientTokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_context: Option<UserContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

pub fn create_client_token(
    secret: &str,
    user_context: UserContext,
    expires_in_secs: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = ClientTokenClaims {
        user_context: Some(user_context),
        exp: Some((now + Duration::seconds(expires_in_secs)).timestamp()),
        iat: Some(now.timestamp()),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decode and verify a client token, returning its user context.
/// A token without an `exp` claim is accepted (only a present, past
/// expiry rejects it).
pub fn validate_client_token(secret: &str, token: &str) -> Result<UserContext, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();

    let data = decode::<ClientTokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        _ => AuthError::InvalidToken(e.to_string()),
    })?;

    Ok(data
        .claims
        .user_context
        .unwrap_or_else(|| serde_json::json!({})))
}
