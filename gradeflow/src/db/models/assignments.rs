//! Database models for assignments.

use crate::api::models::assignments::{AssignmentState, Author, Grade};
use crate::types::{AssignmentId, RoleScopedId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database entity model
#[derive(Debug, Clone, FromRow)]
pub struct Assignment {
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

/// Response type (same as entity for now)
pub type AssignmentDBResponse = Assignment;

/// Request for inserting a new assignment in its initial state
#[derive(Debug, Clone)]
pub struct AssignmentCreateDBRequest {
    pub content: String,
    pub state: AssignmentState,
    pub student_id: RoleScopedId,
    pub teacher_id: Option<RoleScopedId>,
    pub created_by: Author,
    pub due_date: Option<DateTime<Utc>>,
}

/// Which listing to produce
#[derive(Debug, Clone, Copy)]
pub enum AssignmentFilter {
    /// Everything a student owns, newest first
    Student(RoleScopedId),
    /// Submitted or graded work routed to a teacher, most recently touched first
    Teacher(RoleScopedId),
    /// All submitted or graded work, most recently submitted first
    Reviewable,
}

#[derive(Debug, Clone, FromRow)]
pub struct GradeCount {
    pub grade: Option<Grade>,
    pub count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct TopGrader {
    pub teacher_id: RoleScopedId,
    pub a_grades: i64,
}
