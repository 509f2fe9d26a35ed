//! Database models for revoked session tokens.

use chrono::{DateTime, Utc};

/// Database entity model
#[cfg(test)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RevokedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: DateTime<Utc>,
}

/// Request for revoking a token until its natural expiry
#[derive(Debug, Clone)]
pub struct RevokedTokenCreateRequest {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
