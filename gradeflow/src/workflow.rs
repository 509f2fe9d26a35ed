//! The assignment lifecycle.
//!
//! ```text
//!   student create ──► DRAFT ──edit──► DRAFT
//!                        │
//!                      submit (owner, teacher exists)
//!                        ▼
//!   teacher create ──► ASSIGNED     SUBMITTED ──grade (assigned teacher)──► GRADED
//!
//!   principal regrade: any state, grade only
//! ```
//!
//! Each operation validates what it can up front (content length, referenced users existing) and
//! then applies one conditional update in [`Assignments`]. A conditional update that matches no row
//! becomes [`Error::StateConflict`], which deliberately does not say whether the assignment was
//! missing, owned by someone else, or in the wrong state.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::{
    api::models::{
        assignments::{AssignmentState, Author, Grade},
        users::Role,
    },
    db::{
        errors::DbError,
        handlers::{Assignments, Repository, Users},
        models::{
            assignments::{AssignmentCreateDBRequest, AssignmentDBResponse, AssignmentFilter, GradeCount, TopGrader},
            users::{UserDBResponse, UserFilter},
        },
    },
    errors::{Error, Result},
    types::{AssignmentId, RoleScopedId, abbrev_uuid},
};

pub const MIN_CONTENT_LENGTH: usize = 5;

/// Default deadline for teacher-authored assignments
pub const DEFAULT_DUE_IN_DAYS: i64 = 7;

/// A mutation of an assignment, as labelled in metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    CreateDraft,
    CreateAssigned,
    Edit,
    Submit,
    Grade,
    Regrade,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::CreateDraft => "create_draft",
            Transition::CreateAssigned => "create_assigned",
            Transition::Edit => "edit",
            Transition::Submit => "submit",
            Transition::Grade => "grade",
            Transition::Regrade => "regrade",
        }
    }

    fn record(self) {
        metrics::counter!("gradeflow_assignment_transitions_total", "transition" => self.as_str()).increment(1);
    }
}

/// Trim `content` and check it is long enough to store
pub fn validate_content(content: &str) -> Result<String> {
    let trimmed = content.trim();
    if trimmed.chars().count() < MIN_CONTENT_LENGTH {
        return Err(Error::BadRequest {
            message: format!("Content must be at least {MIN_CONTENT_LENGTH} characters"),
        });
    }
    Ok(trimmed.to_string())
}

fn conflict(id: AssignmentId, condition: &'static str) -> Error {
    Error::StateConflict {
        resource: "Assignment".to_string(),
        id: id.to_string(),
        condition,
    }
}

async fn require_role_member(pool: &PgPool, role: Role, role_id: RoleScopedId, resource: &str) -> Result<UserDBResponse> {
    let mut conn = pool.acquire().await.map_err(DbError::from)?;
    Users::new(&mut conn)
        .get_by_role_id(role, role_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: resource.to_string(),
            id: role_id.to_string(),
        })
}

/// A student starts a new draft
#[instrument(skip(pool, content), err)]
pub async fn create_draft(pool: &PgPool, student_id: RoleScopedId, content: &str) -> Result<AssignmentDBResponse> {
    let content = validate_content(content)?;

    let mut conn = pool.acquire().await.map_err(DbError::from)?;
    let assignment = Assignments::new(&mut conn)
        .create(&AssignmentCreateDBRequest {
            content,
            state: AssignmentState::Draft,
            student_id,
            teacher_id: None,
            created_by: Author::Student,
            due_date: None,
        })
        .await?;

    Transition::CreateDraft.record();
    info!("Student {} created draft {}", student_id, abbrev_uuid(&assignment.id));
    Ok(assignment)
}

/// A teacher hands out an assignment to an existing student
#[instrument(skip(pool, content), err)]
pub async fn create_assigned(
    pool: &PgPool,
    teacher_id: RoleScopedId,
    student_id: RoleScopedId,
    content: &str,
    due_date: Option<DateTime<Utc>>,
) -> Result<AssignmentDBResponse> {
    let content = validate_content(content)?;
    require_role_member(pool, Role::Student, student_id, "Student").await?;

    let due_date = due_date.unwrap_or_else(|| Utc::now() + Duration::days(DEFAULT_DUE_IN_DAYS));

    let mut conn = pool.acquire().await.map_err(DbError::from)?;
    let assignment = Assignments::new(&mut conn)
        .create(&AssignmentCreateDBRequest {
            content,
            state: AssignmentState::Assigned,
            student_id,
            teacher_id: Some(teacher_id),
            created_by: Author::Teacher,
            due_date: Some(due_date),
        })
        .await?;

    Transition::CreateAssigned.record();
    info!(
        "Teacher {} assigned {} to student {}",
        teacher_id,
        abbrev_uuid(&assignment.id),
        student_id
    );
    Ok(assignment)
}

/// Replace the content of one of the student's own drafts
#[instrument(skip(pool, content), fields(assignment_id = %abbrev_uuid(&id)), err)]
pub async fn edit(pool: &PgPool, student_id: RoleScopedId, id: AssignmentId, content: &str) -> Result<AssignmentDBResponse> {
    let content = validate_content(content)?;

    let mut conn = pool.acquire().await.map_err(DbError::from)?;
    let assignment = Assignments::new(&mut conn)
        .update_draft_content(id, student_id, &content)
        .await?
        .ok_or_else(|| conflict(id, "not editable"))?;

    Transition::Edit.record();
    Ok(assignment)
}

/// Route one of the student's own drafts to a teacher
#[instrument(skip(pool), fields(assignment_id = %abbrev_uuid(&id)), err)]
pub async fn submit(
    pool: &PgPool,
    student_id: RoleScopedId,
    id: AssignmentId,
    teacher_id: RoleScopedId,
) -> Result<AssignmentDBResponse> {
    require_role_member(pool, Role::Teacher, teacher_id, "Teacher").await?;

    let mut conn = pool.acquire().await.map_err(DbError::from)?;
    let assignment = Assignments::new(&mut conn)
        .submit(id, student_id, teacher_id, Utc::now())
        .await?
        .ok_or_else(|| conflict(id, "already submitted"))?;

    Transition::Submit.record();
    info!("Student {} submitted {} to teacher {}", student_id, abbrev_uuid(&id), teacher_id);
    Ok(assignment)
}

/// Grade a submission routed to this teacher
#[instrument(skip(pool), fields(assignment_id = %abbrev_uuid(&id)), err)]
pub async fn grade(pool: &PgPool, teacher_id: RoleScopedId, id: AssignmentId, grade: Grade) -> Result<AssignmentDBResponse> {
    let mut conn = pool.acquire().await.map_err(DbError::from)?;
    let assignment = Assignments::new(&mut conn)
        .grade(id, teacher_id, grade, Utc::now())
        .await?
        .ok_or_else(|| conflict(id, "already graded"))?;

    Transition::Grade.record();
    info!("Teacher {} graded {} as {:?}", teacher_id, abbrev_uuid(&id), grade);
    Ok(assignment)
}

/// Principal override: set the grade of any assignment, whatever its state
#[instrument(skip(pool), fields(assignment_id = %abbrev_uuid(&id)), err)]
pub async fn regrade(pool: &PgPool, id: AssignmentId, grade: Grade) -> Result<AssignmentDBResponse> {
    let mut conn = pool.acquire().await.map_err(DbError::from)?;
    let assignment = Assignments::new(&mut conn)
        .regrade(id, grade)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Assignment".to_string(),
            id: id.to_string(),
        })?;

    Transition::Regrade.record();
    info!("Principal regraded {} as {:?} (state {})", abbrev_uuid(&id), grade, assignment.state);
    Ok(assignment)
}

async fn list(pool: &PgPool, filter: AssignmentFilter) -> Result<Vec<AssignmentDBResponse>> {
    let mut conn = pool.acquire().await.map_err(DbError::from)?;
    Ok(Assignments::new(&mut conn).list(&filter).await?)
}

pub async fn list_for_student(pool: &PgPool, student_id: RoleScopedId) -> Result<Vec<AssignmentDBResponse>> {
    list(pool, AssignmentFilter::Student(student_id)).await
}

pub async fn list_for_teacher(pool: &PgPool, teacher_id: RoleScopedId) -> Result<Vec<AssignmentDBResponse>> {
    list(pool, AssignmentFilter::Teacher(teacher_id)).await
}

pub async fn list_for_principal(pool: &PgPool) -> Result<Vec<AssignmentDBResponse>> {
    list(pool, AssignmentFilter::Reviewable).await
}

/// Every registered teacher, in registration order
pub async fn list_teachers(pool: &PgPool) -> Result<Vec<UserDBResponse>> {
    let mut conn = pool.acquire().await.map_err(DbError::from)?;
    Ok(Users::new(&mut conn).list(&UserFilter::role(Role::Teacher)).await?)
}

pub async fn grade_distribution(pool: &PgPool) -> Result<Vec<GradeCount>> {
    let mut conn = pool.acquire().await.map_err(DbError::from)?;
    Ok(Assignments::new(&mut conn).grade_counts().await?)
}

pub async fn top_a_grader(pool: &PgPool) -> Result<Option<TopGrader>> {
    let mut conn = pool.acquire().await.map_err(DbError::from)?;
    Ok(Assignments::new(&mut conn).top_a_grader().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_user;
    use axum::http::StatusCode;

    async fn student(pool: &PgPool) -> RoleScopedId {
        create_test_user(pool, Role::Student).await.role.id()
    }

    async fn teacher(pool: &PgPool) -> RoleScopedId {
        create_test_user(pool, Role::Teacher).await.role.id()
    }

    #[test]
    fn test_validate_content() {
        assert_eq!(validate_content("  Hello World  ").unwrap(), "Hello World");
        assert_eq!(validate_content("12345").unwrap(), "12345");

        for short in ["", "    ", "abcd", "  ab  "] {
            let err = validate_content(short).unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert_eq!(err.user_message(), "Content must be at least 5 characters");
        }
    }

    #[sqlx::test]
    async fn test_edit_round_trip(pool: PgPool) {
        let student_id = student(&pool).await;

        let draft = create_draft(&pool, student_id, "Hello World").await.unwrap();
        assert_eq!(draft.state, AssignmentState::Draft);
        assert_eq!(draft.created_by, Author::Student);
        assert_eq!(draft.teacher_id, None);

        let edited = edit(&pool, student_id, draft.id, "  Updated text!!  ").await.unwrap();
        assert_eq!(edited.content, "Updated text!!");
        assert_eq!(edited.state, AssignmentState::Draft);
        assert!(edited.updated_at >= draft.updated_at);

        let listed = list_for_student(&pool, student_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].content, "Updated text!!");
    }

    #[sqlx::test]
    async fn test_short_content_rejected_on_every_authoring_path(pool: PgPool) {
        let student_id = student(&pool).await;
        let teacher_id = teacher(&pool).await;
        let draft = create_draft(&pool, student_id, "A valid draft").await.unwrap();

        let results = [
            create_draft(&pool, student_id, "abc").await,
            create_assigned(&pool, teacher_id, student_id, " ab ", None).await,
            edit(&pool, student_id, draft.id, "xy").await,
        ];
        for result in results {
            assert!(matches!(result, Err(Error::BadRequest { .. })));
        }

        let unchanged = list_for_student(&pool, student_id).await.unwrap();
        assert_eq!(unchanged.len(), 1);
        assert_eq!(unchanged[0].content, "A valid draft");
    }

    #[sqlx::test]
    async fn test_teacher_assignment_defaults_due_date(pool: PgPool) {
        let student_id = student(&pool).await;
        let teacher_id = teacher(&pool).await;

        let before = Utc::now();
        let assigned = create_assigned(&pool, teacher_id, student_id, "Read chapter 3", None).await.unwrap();
        assert_eq!(assigned.state, AssignmentState::Assigned);
        assert_eq!(assigned.created_by, Author::Teacher);
        assert_eq!(assigned.teacher_id, Some(teacher_id));
        let due = assigned.due_date.unwrap();
        assert!(due >= before + Duration::days(DEFAULT_DUE_IN_DAYS));
        assert!(due <= Utc::now() + Duration::days(DEFAULT_DUE_IN_DAYS));

        let explicit = before + Duration::days(1);
        let assigned = create_assigned(&pool, teacher_id, student_id, "Read chapter 4", Some(explicit))
            .await
            .unwrap();
        assert_eq!(assigned.due_date.unwrap().timestamp(), explicit.timestamp());
    }

    #[sqlx::test]
    async fn test_teacher_assignment_requires_existing_student(pool: PgPool) {
        let teacher_id = teacher(&pool).await;
        let err = create_assigned(&pool, teacher_id, 999, "Read chapter 3", None).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.user_message(), "Student not found");
    }

    #[sqlx::test]
    async fn test_submit_requires_existing_teacher(pool: PgPool) {
        let student_id = student(&pool).await;
        let draft = create_draft(&pool, student_id, "Hello World").await.unwrap();

        let err = submit(&pool, student_id, draft.id, 42).await.unwrap_err();
        assert_eq!(err.user_message(), "Teacher not found");

        let still_draft = list_for_student(&pool, student_id).await.unwrap();
        assert_eq!(still_draft[0].state, AssignmentState::Draft);
    }

    #[sqlx::test]
    async fn test_concurrent_submits_have_one_winner(pool: PgPool) {
        let student_id = student(&pool).await;
        let first_teacher = teacher(&pool).await;
        let second_teacher = teacher(&pool).await;
        let draft = create_draft(&pool, student_id, "Race condition").await.unwrap();

        let (a, b) = tokio::join!(
            submit(&pool, student_id, draft.id, first_teacher),
            submit(&pool, student_id, draft.id, second_teacher),
        );

        let winners: Vec<_> = [a, b].into_iter().filter_map(|r| r.ok()).collect();
        assert_eq!(winners.len(), 1);
        assert_eq!(winners[0].state, AssignmentState::Submitted);
        assert!(winners[0].submitted_at.is_some());
    }

    #[sqlx::test]
    async fn test_submitted_work_is_frozen_for_the_student(pool: PgPool) {
        let student_id = student(&pool).await;
        let teacher_id = teacher(&pool).await;
        let draft = create_draft(&pool, student_id, "Hello World").await.unwrap();
        submit(&pool, student_id, draft.id, teacher_id).await.unwrap();

        let err = edit(&pool, student_id, draft.id, "Too late now").await.unwrap_err();
        assert_eq!(err.user_message(), "Assignment not found or not editable");

        let err = submit(&pool, student_id, draft.id, teacher_id).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.user_message(), "Assignment not found or already submitted");
    }

    #[sqlx::test]
    async fn test_grade_requires_submission_to_this_teacher(pool: PgPool) {
        let student_id = student(&pool).await;
        let teacher_a = teacher(&pool).await;
        let teacher_b = teacher(&pool).await;
        let draft = create_draft(&pool, student_id, "Hello World").await.unwrap();

        // Drafts cannot be graded
        assert!(matches!(
            grade(&pool, teacher_a, draft.id, Grade::A).await,
            Err(Error::StateConflict { .. })
        ));

        submit(&pool, student_id, draft.id, teacher_a).await.unwrap();

        // Only the teacher it was routed to
        assert!(matches!(
            grade(&pool, teacher_b, draft.id, Grade::A).await,
            Err(Error::StateConflict { .. })
        ));

        let graded = grade(&pool, teacher_a, draft.id, Grade::B).await.unwrap();
        assert_eq!(graded.state, AssignmentState::Graded);
        assert_eq!(graded.grade, Some(Grade::B));
        assert!(graded.graded_at.is_some());

        let err = grade(&pool, teacher_a, draft.id, Grade::A).await.unwrap_err();
        assert_eq!(err.user_message(), "Assignment not found or already graded");
    }

    #[sqlx::test]
    async fn test_teacher_and_principal_views(pool: PgPool) {
        let student_id = student(&pool).await;
        let teacher_a = teacher(&pool).await;
        let teacher_b = teacher(&pool).await;

        let for_a = create_draft(&pool, student_id, "Essay for A").await.unwrap();
        let for_b = create_draft(&pool, student_id, "Essay for B").await.unwrap();
        let unsubmitted = create_draft(&pool, student_id, "Still drafting").await.unwrap();
        submit(&pool, student_id, for_a.id, teacher_a).await.unwrap();
        submit(&pool, student_id, for_b.id, teacher_b).await.unwrap();
        grade(&pool, teacher_a, for_a.id, Grade::A).await.unwrap();

        let a_view = list_for_teacher(&pool, teacher_a).await.unwrap();
        assert_eq!(a_view.iter().map(|a| a.id).collect::<Vec<_>>(), vec![for_a.id]);

        let b_view = list_for_teacher(&pool, teacher_b).await.unwrap();
        assert_eq!(b_view.iter().map(|a| a.id).collect::<Vec<_>>(), vec![for_b.id]);

        let principal_view = list_for_principal(&pool).await.unwrap();
        assert_eq!(principal_view.len(), 2);
        assert!(principal_view.iter().all(|a| a.id != unsubmitted.id));

        let top = top_a_grader(&pool).await.unwrap().unwrap();
        assert_eq!(top.teacher_id, teacher_a);
        assert_eq!(top.a_grades, 1);

        let teachers = list_teachers(&pool).await.unwrap();
        assert_eq!(teachers.len(), 2);
    }

    #[sqlx::test]
    async fn test_regrade_works_in_any_state(pool: PgPool) {
        let student_id = student(&pool).await;
        let draft = create_draft(&pool, student_id, "Hello World").await.unwrap();

        let regraded = regrade(&pool, draft.id, Grade::C).await.unwrap();
        assert_eq!(regraded.state, AssignmentState::Draft);
        assert_eq!(regraded.grade, Some(Grade::C));

        let counts = grade_distribution(&pool).await.unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].grade, Some(Grade::C));
        assert_eq!(counts[0].count, 1);

        let err = regrade(&pool, uuid::Uuid::new_v4(), Grade::A).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.user_message(), "Assignment not found");
    }
}
