//! Development-only error detail middleware.
//!
//! [`Error`](crate::errors::Error) attaches the full error chain of internal failures to the
//! response as an [`ErrorDetail`] extension. In `development` this middleware copies it into the
//! JSON body as `detail`; in `production` bodies are left untouched.

use axum::{
    Json,
    body::to_bytes,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::{instrument, warn};

use crate::{AppState, errors::ErrorDetail};

/// Error bodies are small JSON objects
const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

#[instrument(skip_all)]
pub async fn error_detail_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    if !state.config.is_development() {
        return response;
    }
    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (parts, body) = response.into_parts();
    let mut json = match to_bytes(body, MAX_ERROR_BODY_BYTES).await {
        Ok(bytes) => serde_json::from_slice::<Value>(&bytes).unwrap_or_else(|_| serde_json::json!({})),
        Err(e) => {
            warn!("Failed to read error body for enrichment: {}", e);
            serde_json::json!({ "message": "Internal server error" })
        }
    };

    if let Some(object) = json.as_object_mut() {
        object.insert("detail".to_string(), Value::String(detail));
    }

    let mut enriched = Json(json).into_response();
    *enriched.status_mut() = parts.status;
    *enriched.extensions_mut() = parts.extensions;
    enriched
}
