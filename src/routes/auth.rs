use crate::{
    auth::{
        generate_token, hash_password, revocation, verify_password, AuthResponse,
        AuthenticatedUser, LoginRequest, RegisterRequest,
    },
    config::AuthSettings,
    error::AppError,
};
use actix_web::{post, web, HttpRequest, HttpResponse, Responder};
use chrono::DateTime;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// Register a new user
///
/// Creates a new user account and returns an authentication token.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    settings: web::Data<AuthSettings>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    register_data.validate()?;

    // Check if email already exists
    let existing_user =
        sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE email = $1")
            .bind(&register_data.email)
            .fetch_optional(&**pool)
            .await?;

    if existing_user.is_some() {
        return Err(AppError::BadRequest("Email already registered".into()));
    }

    // Hash password; only the digest is ever stored
    let password_hash = hash_password(&register_data.password)?;

    // Insert new user
    let user_id = sqlx::query_scalar::<_, i32>(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(&register_data.username)
    .bind(&register_data.email)
    .bind(&password_hash)
    .fetch_one(&**pool)
    .await?;

    // Generate token
    let token = generate_token(user_id, &register_data.email, &settings)?;

    Ok(HttpResponse::Created().json(AuthResponse { token, user_id }))
}

/// Login user
///
/// Authenticates a user and returns an authentication token. Unknown email
/// and wrong password are indistinguishable from the outside: both produce
/// the same generic 401.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    settings: web::Data<AuthSettings>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    login_data.validate()?;

    // Get user from database
    let user = sqlx::query_as::<_, (i32, String)>(
        "SELECT id, password_hash FROM users WHERE email = $1",
    )
    .bind(&login_data.email)
    .fetch_optional(&**pool)
    .await?;

    match user {
        Some((user_id, password_hash)) => {
            // Compare the submitted password against the stored hash
            if verify_password(&login_data.password, &password_hash)? {
                // Generate token
                let token = generate_token(user_id, &login_data.email, &settings)?;
                Ok(HttpResponse::Ok().json(AuthResponse { token, user_id }))
            } else {
                Err(AppError::Unauthorized("Invalid credentials".into()))
            }
        }
        None => Err(AppError::Unauthorized("Invalid credentials".into())),
    }
}

/// Logout user
///
/// Puts the presented token on the revocation denylist so it is rejected on
/// every subsequent request, even though its signature stays valid until the
/// expiry claim. The denylist entry inherits the token's own expiry, after
/// which it becomes purgeable garbage.
#[post("/logout")]
pub async fn logout(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    // The gate already validated this header; re-read it for the raw token.
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let token = match token {
        Some(token) => token,
        None => return Err(AppError::Unauthorized("Unauthorized".into())),
    };

    let expires_at = DateTime::from_timestamp(user.0.exp, 0)
        .ok_or_else(|| AppError::InternalServerError("Invalid expiry claim".into()))?;

    revocation::revoke_token(&pool, token, expires_at).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Logged out successfully"
    })))
}
