//! Database models for users.

use crate::api::models::users::{Role, RoleDetail};
use crate::types::{RoleScopedId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a new user.
///
/// Ids are not part of the request: the repository allocates them from the counters.
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Database entity model
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub role_id: RoleScopedId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database response for a user
#[derive(Debug, Clone)]
pub struct UserDBResponse {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub role: RoleDetail,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDBResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            password_hash: user.password_hash,
            role: RoleDetail::new(user.role, user.role_id),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Filter for listing users
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
}

impl UserFilter {
    pub fn role(role: Role) -> Self {
        Self { role: Some(role) }
    }
}
