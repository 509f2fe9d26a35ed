//! Database repository for assignments.
//!
//! Every state transition is a single conditional `UPDATE ... RETURNING`. The `WHERE` clause
//! carries the full precondition (id, owner, state), so two racing requests cannot both win and
//! a `None` result means "missing, not yours, or not in the required state".

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    api::models::assignments::Grade,
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::assignments::{
            Assignment, AssignmentCreateDBRequest, AssignmentDBResponse, AssignmentFilter, GradeCount, TopGrader,
        },
    },
    types::{AssignmentId, RoleScopedId, abbrev_uuid},
};

pub struct Assignments<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Assignments<'c> {
    type CreateRequest = AssignmentCreateDBRequest;
    type Response = AssignmentDBResponse;
    type Id = AssignmentId;
    type Filter = AssignmentFilter;

    #[instrument(skip(self, request), fields(state = %request.state, student_id = request.student_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            INSERT INTO assignments (id, content, state, student_id, teacher_id, created_by, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.content)
        .bind(request.state)
        .bind(request.student_id)
        .bind(request.teacher_id)
        .bind(request.created_by)
        .bind(request.due_date)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(assignment)
    }

    #[instrument(skip(self), fields(assignment_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let assignment = sqlx::query_as::<_, Assignment>("SELECT * FROM assignments WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(assignment)
    }

    #[instrument(skip(self), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let assignments = match *filter {
            AssignmentFilter::Student(student_id) => {
                sqlx::query_as::<_, Assignment>("SELECT * FROM assignments WHERE student_id = $1 ORDER BY created_at DESC")
                    .bind(student_id)
                    .fetch_all(&mut *self.db)
                    .await?
            }
            AssignmentFilter::Teacher(teacher_id) => {
                sqlx::query_as::<_, Assignment>(
                    r#"
                    SELECT * FROM assignments
                    WHERE teacher_id = $1 AND state IN ('SUBMITTED', 'GRADED')
                    ORDER BY updated_at DESC
                    "#,
                )
                .bind(teacher_id)
                .fetch_all(&mut *self.db)
                .await?
            }
            AssignmentFilter::Reviewable => {
                sqlx::query_as::<_, Assignment>(
                    r#"
                    SELECT * FROM assignments
                    WHERE state IN ('SUBMITTED', 'GRADED')
                    ORDER BY submitted_at DESC NULLS LAST
                    "#,
                )
                .fetch_all(&mut *self.db)
                .await?
            }
        };

        Ok(assignments)
    }
}

impl<'c> Assignments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Replace the content of a draft owned by `student_id`
    #[instrument(skip(self, content), fields(assignment_id = %abbrev_uuid(&id)), err)]
    pub async fn update_draft_content(
        &mut self,
        id: AssignmentId,
        student_id: RoleScopedId,
        content: &str,
    ) -> Result<Option<AssignmentDBResponse>> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            UPDATE assignments
            SET content = $3, updated_at = NOW()
            WHERE id = $1 AND student_id = $2 AND state = 'DRAFT'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(student_id)
        .bind(content)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(assignment)
    }

    /// Move a draft owned by `student_id` to SUBMITTED, routed to `teacher_id`
    #[instrument(skip(self), fields(assignment_id = %abbrev_uuid(&id)), err)]
    pub async fn submit(
        &mut self,
        id: AssignmentId,
        student_id: RoleScopedId,
        teacher_id: RoleScopedId,
        now: DateTime<Utc>,
    ) -> Result<Option<AssignmentDBResponse>> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            UPDATE assignments
            SET state = 'SUBMITTED', teacher_id = $3, submitted_at = $4, updated_at = $4
            WHERE id = $1 AND student_id = $2 AND state = 'DRAFT'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(student_id)
        .bind(teacher_id)
        .bind(now)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(assignment)
    }

    /// Grade a SUBMITTED assignment routed to `teacher_id`
    #[instrument(skip(self), fields(assignment_id = %abbrev_uuid(&id)), err)]
    pub async fn grade(
        &mut self,
        id: AssignmentId,
        teacher_id: RoleScopedId,
        grade: Grade,
        now: DateTime<Utc>,
    ) -> Result<Option<AssignmentDBResponse>> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            UPDATE assignments
            SET state = 'GRADED', grade = $3, graded_at = $4, updated_at = $4
            WHERE id = $1 AND teacher_id = $2 AND state = 'SUBMITTED'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(teacher_id)
        .bind(grade)
        .bind(now)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(assignment)
    }

    /// Overwrite the grade of any assignment, leaving its state untouched
    #[instrument(skip(self), fields(assignment_id = %abbrev_uuid(&id)), err)]
    pub async fn regrade(&mut self, id: AssignmentId, grade: Grade) -> Result<Option<AssignmentDBResponse>> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            UPDATE assignments
            SET grade = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(grade)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(assignment)
    }

    /// Number of assignments per grade, ungraded ones grouped under `None`
    #[instrument(skip(self), err)]
    pub async fn grade_counts(&mut self) -> Result<Vec<GradeCount>> {
        let counts = sqlx::query_as::<_, GradeCount>(
            "SELECT grade, COUNT(*) AS count FROM assignments GROUP BY grade ORDER BY grade NULLS LAST",
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(counts)
    }

    /// The teacher with the most A grades; ties go to the lower teacher id
    #[instrument(skip(self), err)]
    pub async fn top_a_grader(&mut self) -> Result<Option<TopGrader>> {
        let top = sqlx::query_as::<_, TopGrader>(
            r#"
            SELECT teacher_id, COUNT(*) AS a_grades
            FROM assignments
            WHERE grade = 'A' AND teacher_id IS NOT NULL
            GROUP BY teacher_id
            ORDER BY a_grades DESC, teacher_id ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::assignments::{AssignmentState, Author};
    use crate::db::errors::DbError;
    use sqlx::PgPool;

    fn draft(student_id: RoleScopedId, content: &str) -> AssignmentCreateDBRequest {
        AssignmentCreateDBRequest {
            content: content.to_string(),
            state: AssignmentState::Draft,
            student_id,
            teacher_id: None,
            created_by: Author::Student,
            due_date: None,
        }
    }

    #[sqlx::test]
    async fn test_create_and_get(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Assignments::new(&mut conn);

        let created = repo.create(&draft(1, "Hello World")).await.unwrap();
        assert_eq!(created.state, AssignmentState::Draft);
        assert_eq!(created.grade, None);
        assert_eq!(created.teacher_id, None);

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "Hello World");
        assert!(repo.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn test_short_content_rejected_by_check_constraint(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let result = Assignments::new(&mut conn).create(&draft(1, "  abc  ")).await;
        assert!(matches!(result, Err(DbError::CheckViolation { .. })));
    }

    #[sqlx::test]
    async fn test_non_draft_requires_teacher(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut request = draft(1, "Assigned work");
        request.state = AssignmentState::Assigned;
        request.created_by = Author::Teacher;

        let result = Assignments::new(&mut conn).create(&request).await;
        assert!(matches!(result, Err(DbError::CheckViolation { .. })));
    }

    #[sqlx::test]
    async fn test_edit_requires_owner_and_draft(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Assignments::new(&mut conn);
        let created = repo.create(&draft(1, "Hello World")).await.unwrap();

        assert!(repo.update_draft_content(created.id, 2, "Not mine!").await.unwrap().is_none());

        let edited = repo.update_draft_content(created.id, 1, "Updated text!!").await.unwrap().unwrap();
        assert_eq!(edited.content, "Updated text!!");

        repo.submit(created.id, 1, 5, Utc::now()).await.unwrap().unwrap();
        assert!(repo.update_draft_content(created.id, 1, "Too late now").await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn test_submit_then_grade(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Assignments::new(&mut conn);
        let created = repo.create(&draft(1, "Hello World")).await.unwrap();

        // Cannot grade a draft
        assert!(repo.grade(created.id, 5, Grade::A, Utc::now()).await.unwrap().is_none());

        let submitted = repo.submit(created.id, 1, 5, Utc::now()).await.unwrap().unwrap();
        assert_eq!(submitted.state, AssignmentState::Submitted);
        assert_eq!(submitted.teacher_id, Some(5));
        assert!(submitted.submitted_at.is_some());

        // Second submit loses
        assert!(repo.submit(created.id, 1, 6, Utc::now()).await.unwrap().is_none());

        // Only the assigned teacher may grade
        assert!(repo.grade(created.id, 6, Grade::A, Utc::now()).await.unwrap().is_none());

        let graded = repo.grade(created.id, 5, Grade::B, Utc::now()).await.unwrap().unwrap();
        assert_eq!(graded.state, AssignmentState::Graded);
        assert_eq!(graded.grade, Some(Grade::B));
        assert!(graded.graded_at.is_some());

        assert!(repo.grade(created.id, 5, Grade::A, Utc::now()).await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn test_regrade_any_state(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Assignments::new(&mut conn);
        let created = repo.create(&draft(1, "Hello World")).await.unwrap();

        let regraded = repo.regrade(created.id, Grade::C).await.unwrap().unwrap();
        assert_eq!(regraded.grade, Some(Grade::C));
        assert_eq!(regraded.state, AssignmentState::Draft);

        assert!(repo.regrade(Uuid::new_v4(), Grade::C).await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn test_listings(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Assignments::new(&mut conn);

        let first = repo.create(&draft(1, "First draft")).await.unwrap();
        let second = repo.create(&draft(1, "Second draft")).await.unwrap();
        let other = repo.create(&draft(2, "Someone else")).await.unwrap();

        let mine = repo.list(&AssignmentFilter::Student(1)).await.unwrap();
        assert_eq!(mine.iter().map(|a| a.id).collect::<Vec<_>>(), vec![second.id, first.id]);

        // Drafts are invisible to teachers and principals
        assert!(repo.list(&AssignmentFilter::Teacher(5)).await.unwrap().is_empty());
        assert!(repo.list(&AssignmentFilter::Reviewable).await.unwrap().is_empty());

        repo.submit(first.id, 1, 5, Utc::now()).await.unwrap().unwrap();
        repo.submit(other.id, 2, 6, Utc::now()).await.unwrap().unwrap();

        let for_teacher = repo.list(&AssignmentFilter::Teacher(5)).await.unwrap();
        assert_eq!(for_teacher.len(), 1);
        assert_eq!(for_teacher[0].id, first.id);

        let reviewable = repo.list(&AssignmentFilter::Reviewable).await.unwrap();
        assert_eq!(reviewable.iter().map(|a| a.id).collect::<Vec<_>>(), vec![other.id, first.id]);
    }

    #[sqlx::test]
    async fn test_reports(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Assignments::new(&mut conn);

        assert!(repo.top_a_grader().await.unwrap().is_none());

        for (teacher_id, grade) in [(5, Grade::A), (6, Grade::A), (6, Grade::A), (5, Grade::B)] {
            let a = repo.create(&draft(1, "Graded work")).await.unwrap();
            repo.submit(a.id, 1, teacher_id, Utc::now()).await.unwrap().unwrap();
            repo.grade(a.id, teacher_id, grade, Utc::now()).await.unwrap().unwrap();
        }
        repo.create(&draft(1, "Still a draft")).await.unwrap();

        let counts = repo.grade_counts().await.unwrap();
        let pairs: Vec<_> = counts.iter().map(|c| (c.grade, c.count)).collect();
        assert_eq!(pairs, vec![(Some(Grade::A), 3), (Some(Grade::B), 1), (None, 1)]);

        let top = repo.top_a_grader().await.unwrap().unwrap();
        assert_eq!(top.teacher_id, 6);
        assert_eq!(top.a_grades, 2);
    }
}
