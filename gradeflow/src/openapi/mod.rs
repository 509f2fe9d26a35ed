//! OpenAPI documentation for the `/api/v1` surface.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Session tokens are sent as bearer tokens.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "bearer_auth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token from `/auth/register` or `/auth/login`:\n\n\
                            ```\nAuthorization: Bearer YOUR_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "gradeflow",
        description = "Assignment workflow for students, teachers and principals"
    ),
    servers(
        (url = "/api/v1", description = "Assignment API")
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::index::index,
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::students::list_assignments,
        api::handlers::students::create_assignment,
        api::handlers::students::edit_assignment,
        api::handlers::students::submit_assignment,
        api::handlers::teachers::list_assignments,
        api::handlers::teachers::create_assignment,
        api::handlers::teachers::grade_assignment,
        api::handlers::principals::list_assignments,
        api::handlers::principals::regrade_assignment,
        api::handlers::principals::list_teachers,
        api::handlers::principals::grade_report,
        api::handlers::principals::top_a_grader_report,
    ),
    components(
        schemas(
            api::models::auth::RegisterRequest,
            api::models::auth::LoginRequest,
            api::models::auth::AuthResponse,
            api::models::auth::LogoutResponse,
            api::models::auth::ApiIndexResponse,
            api::models::users::Role,
            api::models::users::UserResponse,
            api::models::users::TeacherSummary,
            api::models::assignments::AssignmentState,
            api::models::assignments::Grade,
            api::models::assignments::Author,
            api::models::assignments::AssignmentResponse,
            api::models::assignments::CreateAssignmentRequest,
            api::models::assignments::EditAssignmentRequest,
            api::models::assignments::SubmitAssignmentRequest,
            api::models::assignments::TeacherCreateAssignmentRequest,
            api::models::assignments::GradeAssignmentRequest,
            api::models::assignments::RegradeAssignmentRequest,
            api::models::assignments::GradeCountResponse,
            api::models::assignments::TopGraderResponse,
        )
    ),
    tags(
        (name = "index", description = "API landing document"),
        (name = "authentication", description = "Registration, login and logout"),
        (name = "student", description = "Draft authoring and submission"),
        (name = "teacher", description = "Handing out and grading assignments"),
        (name = "principal", description = "School-wide review, regrading and reports"),
    )
)]
pub struct ApiDoc;
