//! API request/response models for users.

use crate::db::models::users::UserDBResponse;
use crate::types::{RoleScopedId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

// Each user holds exactly one role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Principal,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Teacher, Role::Principal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Principal => "principal",
        }
    }

    /// Name of the `id_counters` row that allocates ids for this role.
    pub fn counter_name(&self) -> &'static str {
        self.as_str()
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL.into_iter().find(|role| role.as_str() == s).ok_or(())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role a user holds together with their id within that role.
///
/// A user has exactly one role-scoped id, so the pairing is one value rather than three optional
/// columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleDetail {
    Student(RoleScopedId),
    Teacher(RoleScopedId),
    Principal(RoleScopedId),
}

impl RoleDetail {
    pub fn new(role: Role, id: RoleScopedId) -> Self {
        match role {
            Role::Student => RoleDetail::Student(id),
            Role::Teacher => RoleDetail::Teacher(id),
            Role::Principal => RoleDetail::Principal(id),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            RoleDetail::Student(_) => Role::Student,
            RoleDetail::Teacher(_) => Role::Teacher,
            RoleDetail::Principal(_) => Role::Principal,
        }
    }

    pub fn id(&self) -> RoleScopedId {
        match self {
            RoleDetail::Student(id) | RoleDetail::Teacher(id) | RoleDetail::Principal(id) => *id,
        }
    }

    pub fn student_id(&self) -> Option<RoleScopedId> {
        match self {
            RoleDetail::Student(id) => Some(*id),
            _ => None,
        }
    }

    pub fn teacher_id(&self) -> Option<RoleScopedId> {
        match self {
            RoleDetail::Teacher(id) => Some(*id),
            _ => None,
        }
    }

    pub fn principal_id(&self) -> Option<RoleScopedId> {
        match self {
            RoleDetail::Principal(id) => Some(*id),
            _ => None,
        }
    }
}

// User response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<RoleScopedId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<RoleScopedId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<RoleScopedId>,
}

/// Entry in the principal's teacher directory
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeacherSummary {
    pub user_id: UserId,
    pub teacher_id: RoleScopedId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The authenticated actor of a request.
///
/// The role detail always comes from the stored user record, never from token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    pub role: RoleDetail,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            user_id: db.id,
            email: db.email,
            role: db.role.role(),
            student_id: db.role.student_id(),
            teacher_id: db.role.teacher_id(),
            principal_id: db.role.principal_id(),
        }
    }
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            role: db.role,
        }
    }
}

impl From<UserDBResponse> for TeacherSummary {
    fn from(db: UserDBResponse) -> Self {
        Self {
            user_id: db.id,
            teacher_id: db.role.id(),
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
