use actix_web::test;
use serde_json::json;
use sqlx::PgPool;
use taskmanager::config::AuthSettings;

/// Auth details for a registered test user.
pub struct TestUser {
    pub id: i32,
    pub token: String,
}

/// Connects to the test database, or returns `None` (skipping the test) when
/// no `DATABASE_URL` is configured or the database is unreachable.
pub async fn connect_test_pool() -> Option<PgPool> {
    dotenv::dotenv().ok();

    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test - DATABASE_URL not set");
            return None;
        }
    };

    match PgPool::connect(&database_url).await {
        Ok(pool) => Some(pool),
        Err(e) => {
            eprintln!("Skipping test - failed to connect to test DB: {}", e);
            None
        }
    }
}

/// Fixed settings for tests; injection means no environment juggling.
pub fn test_auth_settings() -> AuthSettings {
    AuthSettings {
        jwt_secret: "test-jwt-secret-not-for-production".to_string(),
        token_ttl_hours: 24,
    }
}

pub async fn cleanup_user(pool: &PgPool, email: &str) {
    let _ = sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await;
}

pub async fn cleanup_blacklisted_token(pool: &PgPool, token: &str) {
    let _ = sqlx::query("DELETE FROM blacklisted_tokens WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await;
}

/// Registers a user through the API and returns their id and token.
pub async fn register_user(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    email: &str,
    username: &str,
    password: &str,
) -> Result<TestUser, String> {
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": username,
            "email": email,
            "password": password
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;

    if !status.is_success() {
        return Err(format!(
            "Failed to register user. Status: {}. Body: {}",
            status,
            String::from_utf8_lossy(&body)
        ));
    }

    let auth_response: taskmanager::auth::AuthResponse = serde_json::from_slice(&body)
        .map_err(|e| format!("Failed to parse registration response: {}", e))?;

    Ok(TestUser {
        id: auth_response.user_id,
        token: auth_response.token,
    })
}
