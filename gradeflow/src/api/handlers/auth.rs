use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        auth::{AuthResponse, LoginRequest, LogoutResponse, RegisterRequest},
        users::{CurrentUser, Role, UserResponse},
    },
    auth::{current_user::CurrentSession, password, session},
    db::{
        errors::DbError,
        handlers::{Repository, RevokedTokens, Users},
        models::{revoked_tokens::RevokedTokenCreateRequest, users::UserCreateDBRequest},
    },
    errors::{AuthRejection, Error},
};

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Register a new account holding exactly one role
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Missing fields, invalid role, bad password length, or duplicate email"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), Error> {
    let Json(request) = body?;
    let (Some(email), Some(password), Some(role)) = (present(request.email), request.password, present(request.role)) else {
        return Err(Error::BadRequest {
            message: "Please provide email, password, and role".to_string(),
        });
    };

    let role: Role = role.parse().map_err(|_| Error::BadRequest {
        message: "Invalid role. Valid roles: student, teacher, principal".to_string(),
    })?;

    // Validate password length
    let password_config = &state.config.auth.password;
    if password.chars().count() < password_config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }
    if password.chars().count() > password_config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", password_config.max_length),
        });
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut user_repo = Users::new(&mut conn);

    if user_repo.get_by_email(&email).await?.is_some() {
        return Err(Error::BadRequest {
            message: "User already exists with this email".to_string(),
        });
    }

    // A concurrent registration for the same email still fails on the unique constraint
    let password_hash = password::hash_password(password, password_config.argon2_params()).await?;
    let created_user = user_repo
        .create(&UserCreateDBRequest {
            email,
            password_hash,
            role,
        })
        .await?;

    let current_user = CurrentUser::from(created_user.clone());
    let token = session::create_session_token(&current_user, &state.config)?;
    tracing::info!("Registered user {} as {}", created_user.id, created_user.role.role());

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::new(token, UserResponse::from(created_user))),
    ))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, Error> {
    let Json(request) = body?;
    let (Some(email), Some(password)) = (present(request.email), request.password.filter(|p| !p.is_empty())) else {
        return Err(Error::BadRequest {
            message: "Please provide email and password".to_string(),
        });
    };

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    // Unknown email and wrong password are indistinguishable to the caller
    let user = Users::new(&mut conn)
        .get_by_email(&email)
        .await?
        .ok_or(Error::from(AuthRejection::BadCredentials))?;

    if !password::verify_password(password, user.password_hash.clone()).await? {
        return Err(AuthRejection::BadCredentials.into());
    }

    let current_user = CurrentUser::from(user.clone());
    let token = session::create_session_token(&current_user, &state.config)?;

    Ok(Json(AuthResponse::new(token, UserResponse::from(user))))
}

/// Logout: revoke the bearer token for the rest of its lifetime
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = LogoutResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: CurrentSession) -> Result<Json<LogoutResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    RevokedTokens::new(&mut conn)
        .revoke(&RevokedTokenCreateRequest {
            token: session.token,
            expires_at: session.claims.expires_at(),
        })
        .await?;

    tracing::info!("User {} logged out", session.user.id);

    Ok(Json(LogoutResponse {
        success: true,
        message: "Successfully logged out".to_string(),
    }))
}
