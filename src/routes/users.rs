use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{User, UserUpdateInput},
};
use actix_web::{delete, get, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// Returns the authenticated user's own record.
///
/// The record never includes the password hash.
#[get("/me")]
pub async fn show_me(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let record = sqlx::query_as::<_, User>(
        "SELECT id, username, email, created_at FROM users WHERE id = $1",
    )
    .bind(user.id())
    .fetch_optional(&**pool)
    .await?;

    match record {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        // The account was deleted while the token was still live.
        None => Err(AppError::NotFound("User not found".into())),
    }
}

/// Updates the authenticated user's username and email.
///
/// Only the account behind the presented token can be updated; the target id
/// comes from the verified claims, never from the request body.
#[put("/me")]
pub async fn update_me(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    update_data: web::Json<UserUpdateInput>,
) -> Result<impl Responder, AppError> {
    update_data.validate()?;

    // Reject an email already taken by another account
    let email_taken =
        sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE email = $1 AND id <> $2")
            .bind(&update_data.email)
            .bind(user.id())
            .fetch_optional(&**pool)
            .await?;

    if email_taken.is_some() {
        return Err(AppError::BadRequest("Email already registered".into()));
    }

    let updated = sqlx::query_as::<_, User>(
        "UPDATE users SET username = $1, email = $2 WHERE id = $3
         RETURNING id, username, email, created_at",
    )
    .bind(&update_data.username)
    .bind(&update_data.email)
    .bind(user.id())
    .fetch_optional(&**pool)
    .await?;

    match updated {
        Some(updated) => Ok(HttpResponse::Ok().json(updated)),
        None => Err(AppError::NotFound("User not found".into())),
    }
}

/// Deletes the authenticated user's account.
///
/// Owned tasks are removed by the schema's cascade rule.
#[delete("/me")]
pub async fn delete_me(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user.id())
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "User deleted successfully"
    })))
}
