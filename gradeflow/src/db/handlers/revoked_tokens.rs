//! Database repository for revoked session tokens.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::instrument;

#[cfg(test)]
use crate::db::models::revoked_tokens::RevokedToken;
use crate::db::{errors::Result, models::revoked_tokens::RevokedTokenCreateRequest};

pub struct RevokedTokens<'c> {
    db: &'c mut PgConnection,
}

impl<'c> RevokedTokens<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Add a token to the revocation list. Revoking the same token twice is a no-op.
    #[instrument(skip(self, request), fields(expires_at = %request.expires_at), err)]
    pub async fn revoke(&mut self, request: &RevokedTokenCreateRequest) -> Result<()> {
        sqlx::query("INSERT INTO revoked_tokens (token, expires_at) VALUES ($1, $2) ON CONFLICT (token) DO NOTHING")
            .bind(&request.token)
            .bind(request.expires_at)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }

    /// Whether a token is revoked as of `now`. Entries past their expiry no longer count.
    #[instrument(skip_all, err)]
    pub async fn is_revoked(&mut self, token: &str, now: DateTime<Utc>) -> Result<bool> {
        let revoked = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE token = $1 AND expires_at > $2)")
            .bind(token)
            .bind(now)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(revoked)
    }

    #[cfg(test)]
    pub async fn get(&mut self, token: &str) -> Result<Option<RevokedToken>> {
        let entry = sqlx::query_as::<_, RevokedToken>("SELECT token, expires_at, revoked_at FROM revoked_tokens WHERE token = $1")
            .bind(token)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(entry)
    }

    /// Delete entries whose expiry is at or before `now`, returning how many were removed
    #[instrument(skip(self), err)]
    pub async fn purge_expired(&mut self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }
}
