use crate::auth::error::AuthError;
use crate::config::AuthSettings;
use crate::error::AppError;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Typed claims carried by a session token.
///
/// An explicit record rather than a free-form map: a missing or mistyped
/// claim fails at deserialization instead of surfacing later as a bad lookup.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject of the token: the user's unique identifier.
    pub sub: i32,
    /// Email of the authenticated user, for downstream handlers.
    pub email: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch). Every token this service
    /// mints is time-bounded.
    pub exp: i64,
}

/// Generates a signed session token for a user.
///
/// The token is HS256-signed with the injected secret and expires after the
/// configured TTL. Two calls for the same user produce tokens that both
/// verify but differ byte-for-byte once a second has passed (`iat` moves).
///
/// # Arguments
/// * `user_id` - The ID of the user for whom the token is generated.
/// * `email` - The user's email, embedded as an identity attribute.
/// * `settings` - Signing secret and TTL, loaded once at startup.
///
/// # Returns
/// A `Result` containing the JWT string if successful, or
/// `AppError::InternalServerError` if encoding fails.
pub fn generate_token(
    user_id: i32,
    email: &str,
    settings: &AuthSettings,
) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let expiration = now
        .checked_add_signed(chrono::Duration::hours(settings.token_ttl_hours))
        .expect("valid timestamp")
        .timestamp();

    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        iat: now.timestamp(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
}

/// Verifies a token string and decodes its claims.
///
/// Checks run in order: structure, signing algorithm (HS256 only — a token
/// declaring any other algorithm is rejected before signature verification),
/// signature against the injected secret, then expiry. Each failure maps to
/// a distinct `AuthError` kind; the HTTP boundary collapses them all into
/// one generic unauthorized response.
pub fn verify_token(token: &str, settings: &AuthSettings) -> Result<Claims, AuthError> {
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(AuthError::from)
}
