use axum::Json;
use std::collections::BTreeMap;

use crate::api::models::auth::ApiIndexResponse;

/// Describe the API and its role surfaces
#[utoipa::path(
    get,
    path = "/",
    tag = "index",
    responses(
        (status = 200, description = "API index", body = ApiIndexResponse),
    )
)]
#[tracing::instrument]
pub async fn index() -> Json<ApiIndexResponse> {
    let endpoints = ["student", "teacher", "principal"]
        .into_iter()
        .map(|surface| (surface.to_string(), format!("/{surface}")))
        .collect::<BTreeMap<_, _>>();

    Json(ApiIndexResponse {
        message: "Assignment Management System API".to_string(),
        endpoints,
    })
}
