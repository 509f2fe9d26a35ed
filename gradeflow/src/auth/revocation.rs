//! Background reaper for the revoked-token deny-list.
//!
//! Revocation entries only matter until the token they revoke would have expired anyway. The reaper
//! periodically deletes entries past that point so the table stays bounded by the number of live
//! sessions that were logged out.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::db::{errors::DbError, handlers::RevokedTokens};

/// Remove every entry that has lapsed as of `now`
pub async fn purge_once(pool: &PgPool, now: DateTime<Utc>) -> Result<u64, DbError> {
    let mut conn = pool.acquire().await?;
    RevokedTokens::new(&mut conn).purge_expired(now).await
}

/// Run the reaper until `shutdown` is cancelled.
///
/// Failures are logged and retried on the next tick.
pub async fn run_reaper(pool: PgPool, every: Duration, shutdown: CancellationToken) {
    info!("Starting revoked token reaper (interval {:?})", every);
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Revoked token reaper shutting down");
                break;
            }
            _ = interval.tick() => {
                match purge_once(&pool, Utc::now()).await {
                    Ok(0) => debug!("No expired revocation entries"),
                    Ok(purged) => info!("Purged {} expired revocation entries", purged),
                    Err(e) => warn!("Failed to purge expired revocation entries: {}", e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::revoked_tokens::RevokedTokenCreateRequest;
    use chrono::Duration as ChronoDuration;

    async fn revoke(pool: &PgPool, token: &str, expires_at: DateTime<Utc>) {
        let mut conn = pool.acquire().await.unwrap();
        RevokedTokens::new(&mut conn)
            .revoke(&RevokedTokenCreateRequest {
                token: token.to_string(),
                expires_at,
            })
            .await
            .unwrap();
    }

    async fn remaining(pool: &PgPool) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM revoked_tokens")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test]
    async fn test_purge_once_keeps_live_entries(pool: PgPool) {
        let now = Utc::now();
        revoke(&pool, "lapsed", now - ChronoDuration::minutes(1)).await;
        revoke(&pool, "live", now + ChronoDuration::hours(1)).await;

        assert_eq!(purge_once(&pool, now).await.unwrap(), 1);
        assert_eq!(remaining(&pool).await, 1);
        assert_eq!(purge_once(&pool, now).await.unwrap(), 0);
    }

    #[sqlx::test]
    async fn test_reaper_purges_then_stops_on_cancel(pool: PgPool) {
        revoke(&pool, "lapsed", Utc::now() - ChronoDuration::minutes(1)).await;

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(run_reaper(pool.clone(), Duration::from_millis(20), shutdown.clone()));

        // The first tick fires immediately
        for _ in 0..50 {
            if remaining(&pool).await == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(remaining(&pool).await, 0);

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("reaper should stop after cancellation")
            .unwrap();
    }
}
