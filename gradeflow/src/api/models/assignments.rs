//! API request/response models for assignments.

use crate::db::models::assignments::{AssignmentDBResponse, GradeCount, TopGrader};
use crate::types::{AssignmentId, RoleScopedId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Lifecycle state of an assignment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "assignment_state", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AssignmentState {
    Draft,
    Assigned,
    Submitted,
    Graded,
}

impl fmt::Display for AssignmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AssignmentState::Draft => "DRAFT",
            AssignmentState::Assigned => "ASSIGNED",
            AssignmentState::Submitted => "SUBMITTED",
            AssignmentState::Graded => "GRADED",
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "grade")]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

/// Which kind of user authored an assignment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "assignment_author", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Author {
    Student,
    Teacher,
}

// Request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateAssignmentRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EditAssignmentRequest {
    #[schema(value_type = String, format = "uuid")]
    pub id: AssignmentId,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitAssignmentRequest {
    #[schema(value_type = String, format = "uuid")]
    pub id: AssignmentId,
    pub teacher_id: RoleScopedId,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeacherCreateAssignmentRequest {
    pub student_id: Option<RoleScopedId>,
    pub content: Option<String>,
    /// Defaults to one week from now
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GradeAssignmentRequest {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub assignment_id: Option<AssignmentId>,
    pub grade: Option<Grade>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegradeAssignmentRequest {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub id: Option<AssignmentId>,
    pub grade: Option<Grade>,
}

// Response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignmentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AssignmentId,
    pub content: String,
    pub state: AssignmentState,
    pub grade: Option<Grade>,
    pub student_id: RoleScopedId,
    pub teacher_id: Option<RoleScopedId>,
    pub created_by: Author,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub graded_at: Option<DateTime<Utc>>,
}

impl From<AssignmentDBResponse> for AssignmentResponse {
    fn from(db: AssignmentDBResponse) -> Self {
        Self {
            id: db.id,
            content: db.content,
            state: db.state,
            grade: db.grade,
            student_id: db.student_id,
            teacher_id: db.teacher_id,
            created_by: db.created_by,
            due_date: db.due_date,
            created_at: db.created_at,
            updated_at: db.updated_at,
            submitted_at: db.submitted_at,
            graded_at: db.graded_at,
        }
    }
}

/// Standard success envelope for assignment endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignmentEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub data: T,
}

impl<T> AssignmentEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            count: None,
            data,
        }
    }
}

impl<T> AssignmentEnvelope<Vec<T>> {
    pub fn counted(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: Some(data.len()),
            data,
        }
    }
}

/// Number of assignments holding a given grade; `grade` is null for ungraded records
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GradeCountResponse {
    pub grade: Option<Grade>,
    pub count: i64,
}

impl From<GradeCount> for GradeCountResponse {
    fn from(row: GradeCount) -> Self {
        Self {
            grade: row.grade,
            count: row.count,
        }
    }
}

/// Teacher who has awarded the most A grades
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopGraderResponse {
    pub teacher_id: RoleScopedId,
    pub a_grades: i64,
}

impl From<TopGrader> for TopGraderResponse {
    fn from(row: TopGrader) -> Self {
        Self {
            teacher_id: row.teacher_id,
            a_grades: row.a_grades,
        }
    }
}
