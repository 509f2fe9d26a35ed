use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::assignments::{AssignmentEnvelope, AssignmentResponse, GradeAssignmentRequest, TeacherCreateAssignmentRequest},
    auth::permissions::{RequiresRole, role},
    errors::Error,
    workflow,
};

/// List work submitted to the caller (submitted or graded), most recently touched first
#[utoipa::path(
    get,
    path = "/teacher/assignments",
    tag = "teacher",
    responses(
        (status = 200, description = "Assignments routed to this teacher", body = AssignmentEnvelope<Vec<AssignmentResponse>>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not a teacher"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_assignments(
    State(state): State<AppState>,
    teacher: RequiresRole<role::Teacher>,
) -> Result<Json<AssignmentEnvelope<Vec<AssignmentResponse>>>, Error> {
    let assignments = workflow::list_for_teacher(&state.db, teacher.role_id).await?;
    Ok(Json(AssignmentEnvelope::new(
        assignments.into_iter().map(AssignmentResponse::from).collect(),
    )))
}

/// Hand out an assignment to a student
#[utoipa::path(
    post,
    path = "/teacher/assignments",
    request_body = TeacherCreateAssignmentRequest,
    tag = "teacher",
    responses(
        (status = 201, description = "Assignment created", body = AssignmentEnvelope<AssignmentResponse>),
        (status = 400, description = "Missing student or content, or content too short"),
        (status = 404, description = "Student not found"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_assignment(
    State(state): State<AppState>,
    teacher: RequiresRole<role::Teacher>,
    body: Result<Json<TeacherCreateAssignmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AssignmentEnvelope<AssignmentResponse>>), Error> {
    let Json(request) = body?;
    let (Some(student_id), Some(content)) = (request.student_id, request.content.filter(|c| !c.is_empty())) else {
        return Err(Error::BadRequest {
            message: "Missing student ID or assignment content".to_string(),
        });
    };

    let assignment = workflow::create_assigned(&state.db, teacher.role_id, student_id, &content, request.due_date).await?;
    Ok((StatusCode::CREATED, Json(AssignmentEnvelope::new(assignment.into()))))
}

/// Grade a submission routed to the caller
#[utoipa::path(
    post,
    path = "/teacher/assignments/grade",
    request_body = GradeAssignmentRequest,
    tag = "teacher",
    responses(
        (status = 200, description = "Assignment graded", body = AssignmentEnvelope<AssignmentResponse>),
        (status = 400, description = "Missing or invalid assignment ID or grade"),
        (status = 404, description = "Assignment not found or already graded"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn grade_assignment(
    State(state): State<AppState>,
    teacher: RequiresRole<role::Teacher>,
    body: Result<Json<GradeAssignmentRequest>, JsonRejection>,
) -> Result<Json<AssignmentEnvelope<AssignmentResponse>>, Error> {
    let Json(request) = body?;
    let (Some(id), Some(grade)) = (request.assignment_id, request.grade) else {
        return Err(Error::BadRequest {
            message: "Missing assignment ID or grade".to_string(),
        });
    };

    let assignment = workflow::grade(&state.db, teacher.role_id, id, grade).await?;
    Ok(Json(AssignmentEnvelope::new(assignment.into())))
}
