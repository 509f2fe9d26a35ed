use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::assignments::{
        AssignmentEnvelope, AssignmentResponse, CreateAssignmentRequest, EditAssignmentRequest, SubmitAssignmentRequest,
    },
    auth::permissions::{RequiresRole, role},
    errors::Error,
    workflow,
};

/// List the caller's own assignments, newest first
#[utoipa::path(
    get,
    path = "/student/assignments",
    tag = "student",
    responses(
        (status = 200, description = "The student's assignments", body = AssignmentEnvelope<Vec<AssignmentResponse>>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not a student"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_assignments(
    State(state): State<AppState>,
    student: RequiresRole<role::Student>,
) -> Result<Json<AssignmentEnvelope<Vec<AssignmentResponse>>>, Error> {
    let assignments = workflow::list_for_student(&state.db, student.role_id).await?;
    Ok(Json(AssignmentEnvelope::counted(
        assignments.into_iter().map(AssignmentResponse::from).collect(),
    )))
}

/// Start a new draft
#[utoipa::path(
    post,
    path = "/student/assignments",
    request_body = CreateAssignmentRequest,
    tag = "student",
    responses(
        (status = 201, description = "Draft created", body = AssignmentEnvelope<AssignmentResponse>),
        (status = 400, description = "Content too short"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_assignment(
    State(state): State<AppState>,
    student: RequiresRole<role::Student>,
    body: Result<Json<CreateAssignmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AssignmentEnvelope<AssignmentResponse>>), Error> {
    let Json(request) = body?;
    let assignment = workflow::create_draft(&state.db, student.role_id, &request.content).await?;
    Ok((StatusCode::CREATED, Json(AssignmentEnvelope::new(assignment.into()))))
}

/// Replace the content of one of the caller's drafts
#[utoipa::path(
    put,
    path = "/student/assignments",
    request_body = EditAssignmentRequest,
    tag = "student",
    responses(
        (status = 200, description = "Draft updated", body = AssignmentEnvelope<AssignmentResponse>),
        (status = 400, description = "Content too short"),
        (status = 404, description = "Assignment not found or not editable"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn edit_assignment(
    State(state): State<AppState>,
    student: RequiresRole<role::Student>,
    body: Result<Json<EditAssignmentRequest>, JsonRejection>,
) -> Result<Json<AssignmentEnvelope<AssignmentResponse>>, Error> {
    let Json(request) = body?;
    let assignment = workflow::edit(&state.db, student.role_id, request.id, &request.content).await?;
    Ok(Json(AssignmentEnvelope::new(assignment.into())))
}

/// Submit one of the caller's drafts to a teacher
#[utoipa::path(
    post,
    path = "/student/assignments/submit",
    request_body = SubmitAssignmentRequest,
    tag = "student",
    responses(
        (status = 200, description = "Assignment submitted", body = AssignmentEnvelope<AssignmentResponse>),
        (status = 404, description = "Teacher not found, or assignment not found or already submitted"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn submit_assignment(
    State(state): State<AppState>,
    student: RequiresRole<role::Student>,
    body: Result<Json<SubmitAssignmentRequest>, JsonRejection>,
) -> Result<Json<AssignmentEnvelope<AssignmentResponse>>, Error> {
    let Json(request) = body?;
    let assignment = workflow::submit(&state.db, student.role_id, request.id, request.teacher_id).await?;
    Ok(Json(AssignmentEnvelope::new(assignment.into())))
}
