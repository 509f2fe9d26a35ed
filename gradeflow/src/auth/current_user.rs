use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session::{self, SessionClaims},
    db::{
        errors::DbError,
        handlers::{Repository, RevokedTokens, Users},
    },
    errors::{AuthRejection, Error, Result},
};
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;
use tracing::{debug, instrument, trace};

/// An authenticated request: the resolved user together with the bearer token that
/// authenticated it and the token's verified claims.
///
/// Handlers that need the raw token (logout) extract this; everything else extracts
/// [`CurrentUser`].
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub user: CurrentUser,
    pub token: String,
    pub claims: SessionClaims,
}

/// Pull the token out of an `Authorization: Bearer <token>` header
fn bearer_token(parts: &Parts) -> Result<&str> {
    let token = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    token.ok_or_else(|| AuthRejection::NoToken.into())
}

/// Resolve a bearer token to a session.
///
/// Order matters: the signature and expiry are verified before the token is looked up anywhere,
/// and the identity is always re-read from the database so a deleted user cannot keep using an
/// old token.
#[instrument(skip_all, err)]
pub async fn authenticate(token: &str, state: &AppState) -> Result<CurrentSession> {
    let claims = session::verify_session_token(token, &state.config)?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    if RevokedTokens::new(&mut conn).is_revoked(token, Utc::now()).await? {
        trace!("Rejected revoked token for user {}", claims.sub);
        return Err(AuthRejection::Revoked.into());
    }

    let user = Users::new(&mut conn)
        .get_by_id(claims.sub)
        .await?
        .ok_or(Error::Unauthenticated {
            reason: AuthRejection::UnknownIdentity,
        })?;

    Ok(CurrentSession {
        user: CurrentUser::from(user),
        token: token.to_string(),
        claims,
    })
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(parts)?;
        let session = authenticate(token, state).await?;
        debug!("Authenticated user {} as {}", session.user.id, session.user.role.role());
        Ok(session)
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        CurrentSession::from_request_parts(parts, state).await.map(|session| session.user)
    }
}
