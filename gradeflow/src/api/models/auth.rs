//! API request/response models for authentication.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::api::models::users::UserResponse;

/// Fields are optional so a missing one is reported with a readable message
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    /// One of `student`, `teacher`, `principal`
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Returned by both register and login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub data: UserResponse,
}

impl AuthResponse {
    pub fn new(token: String, data: UserResponse) -> Self {
        Self {
            success: true,
            token,
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

/// Landing document for `GET /api/v1`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiIndexResponse {
    pub message: String,
    /// Role surface name to its path prefix
    pub endpoints: BTreeMap<String, String>,
}
