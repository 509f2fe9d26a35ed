use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{
    AppState,
    api::models::{
        assignments::{AssignmentEnvelope, AssignmentResponse, GradeCountResponse, RegradeAssignmentRequest, TopGraderResponse},
        users::TeacherSummary,
    },
    auth::permissions::{RequiresRole, role},
    errors::Error,
    workflow,
};

/// List every submitted or graded assignment, most recently submitted first
#[utoipa::path(
    get,
    path = "/principal/assignments",
    tag = "principal",
    responses(
        (status = 200, description = "All reviewable assignments", body = AssignmentEnvelope<Vec<AssignmentResponse>>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not a principal"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_assignments(
    State(state): State<AppState>,
    _principal: RequiresRole<role::Principal>,
) -> Result<Json<AssignmentEnvelope<Vec<AssignmentResponse>>>, Error> {
    let assignments = workflow::list_for_principal(&state.db).await?;
    Ok(Json(AssignmentEnvelope::counted(
        assignments.into_iter().map(AssignmentResponse::from).collect(),
    )))
}

/// Override the grade of any assignment. The assignment's state is left as it is.
#[utoipa::path(
    post,
    path = "/principal/assignments/grade",
    request_body = RegradeAssignmentRequest,
    tag = "principal",
    responses(
        (status = 200, description = "Grade overwritten", body = AssignmentEnvelope<AssignmentResponse>),
        (status = 400, description = "Missing or invalid assignment ID or grade"),
        (status = 404, description = "Assignment not found"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn regrade_assignment(
    State(state): State<AppState>,
    _principal: RequiresRole<role::Principal>,
    body: Result<Json<RegradeAssignmentRequest>, JsonRejection>,
) -> Result<Json<AssignmentEnvelope<AssignmentResponse>>, Error> {
    let Json(request) = body?;
    let (Some(id), Some(grade)) = (request.id, request.grade) else {
        return Err(Error::BadRequest {
            message: "Missing assignment ID or grade".to_string(),
        });
    };

    let assignment = workflow::regrade(&state.db, id, grade).await?;
    Ok(Json(AssignmentEnvelope::new(assignment.into())))
}

/// Directory of registered teachers
#[utoipa::path(
    get,
    path = "/principal/teachers",
    tag = "principal",
    responses(
        (status = 200, description = "All teachers", body = AssignmentEnvelope<Vec<TeacherSummary>>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_teachers(
    State(state): State<AppState>,
    _principal: RequiresRole<role::Principal>,
) -> Result<Json<AssignmentEnvelope<Vec<TeacherSummary>>>, Error> {
    let teachers = workflow::list_teachers(&state.db).await?;
    Ok(Json(AssignmentEnvelope::new(teachers.into_iter().map(TeacherSummary::from).collect())))
}

/// Number of assignments per grade
#[utoipa::path(
    get,
    path = "/principal/reports/grades",
    tag = "principal",
    responses(
        (status = 200, description = "Counts per grade, ungraded under null", body = AssignmentEnvelope<Vec<GradeCountResponse>>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn grade_report(
    State(state): State<AppState>,
    _principal: RequiresRole<role::Principal>,
) -> Result<Json<AssignmentEnvelope<Vec<GradeCountResponse>>>, Error> {
    let counts = workflow::grade_distribution(&state.db).await?;
    Ok(Json(AssignmentEnvelope::new(counts.into_iter().map(GradeCountResponse::from).collect())))
}

/// The teacher who has given the most A grades, or null when nobody has
#[utoipa::path(
    get,
    path = "/principal/reports/top-a-grader",
    tag = "principal",
    responses(
        (status = 200, description = "Top A grader", body = AssignmentEnvelope<Option<TopGraderResponse>>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn top_a_grader_report(
    State(state): State<AppState>,
    _principal: RequiresRole<role::Principal>,
) -> Result<Json<AssignmentEnvelope<Option<TopGraderResponse>>>, Error> {
    let top = workflow::top_a_grader(&state.db).await?;
    Ok(Json(AssignmentEnvelope::new(top.map(TopGraderResponse::from))))
}
