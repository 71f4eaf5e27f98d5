//! Token revocation registry backed by the `blacklisted_tokens` table.
//!
//! Tokens are stateless, so invalidating one before its natural expiry means
//! recording it in a denylist that the authorization middleware consults on
//! every protected request. Entries become dead weight once the token's own
//! expiry passes — the expiry check would reject it anyway — so the lookup
//! ignores them and a background sweep deletes them.

use chrono::{DateTime, Utc};
use log::{info, warn};
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

/// How often the background sweep deletes expired denylist entries.
const PURGE_INTERVAL: Duration = Duration::from_secs(3600);

/// Records a token on the denylist until `expires_at`.
///
/// Idempotent: revoking the same token twice is a no-op the second time,
/// guaranteed by the unique constraint on the token column.
pub async fn revoke_token(
    pool: &PgPool,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO blacklisted_tokens (id, token, expires_at) VALUES ($1, $2, $3)
         ON CONFLICT (token) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(token)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns whether a token is currently revoked.
///
/// An entry whose `expires_at` has passed no longer revokes anything: the
/// token itself is expired and fails validation regardless, so stale rows
/// are treated as absent rather than blocking until the sweep removes them.
pub async fn is_token_revoked(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM blacklisted_tokens WHERE token = $1 AND expires_at > $2)",
    )
    .bind(token)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

/// Deletes denylist entries whose tokens have expired naturally.
///
/// Best-effort storage bounding only; request-path correctness never depends
/// on this running.
pub async fn purge_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM blacklisted_tokens WHERE expires_at <= $1")
        .bind(Utc::now())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Spawns the periodic denylist sweep on the current runtime.
///
/// Runs until the process exits; a failed pass is logged and retried on the
/// next tick.
pub fn spawn_purge_task(pool: PgPool) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match purge_expired(&pool).await {
                Ok(0) => {}
                Ok(count) => info!("Purged {} expired entries from the token denylist", count),
                Err(e) => warn!("Token denylist purge failed: {}", e),
            }
        }
    });
}
