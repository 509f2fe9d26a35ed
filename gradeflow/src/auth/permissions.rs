//! Role-based access control.
//!
//! Every route belongs to exactly one role surface. Handlers declare the role they need in their
//! signature with [`RequiresRole`]; the extractor authenticates the request first (401 on failure)
//! and then checks role membership (403 on failure).
//!
//! ```ignore
//! pub async fn list_assignments(
//!     State(state): State<AppState>,
//!     student: RequiresRole<role::Student>,
//! ) -> Result<Json<...>, Error> {
//!     // student.role_id is the caller's student_id
//! }
//! ```

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::instrument;

use crate::{
    AppState,
    api::models::users::{CurrentUser, Role},
    errors::{Error, Result},
    types::RoleScopedId,
};

/// Type-level role markers for [`RequiresRole`]
pub mod role {
    use crate::api::models::users::Role;

    pub trait RoleMarker: Send + Sync + 'static {
        const ROLE: Role;
    }

    pub struct Student;
    pub struct Teacher;
    pub struct Principal;

    impl RoleMarker for Student {
        const ROLE: Role = Role::Student;
    }

    impl RoleMarker for Teacher {
        const ROLE: Role = Role::Teacher;
    }

    impl RoleMarker for Principal {
        const ROLE: Role = Role::Principal;
    }
}

/// Check that `user` holds `required`, returning their id within that role.
pub fn authorize(user: &CurrentUser, required: Role) -> Result<RoleScopedId> {
    if user.role.role() == required {
        Ok(user.role.id())
    } else {
        Err(Error::InsufficientRole { required })
    }
}

impl CurrentUser {
    /// See [`authorize`]
    pub fn require(&self, required: Role) -> Result<RoleScopedId> {
        authorize(self, required)
    }
}

/// Extractor for an authenticated user holding role `R`.
pub struct RequiresRole<R: role::RoleMarker> {
    pub user: CurrentUser,
    /// The caller's id within `R` (their student_id, teacher_id or principal_id)
    pub role_id: RoleScopedId,
    _role: PhantomData<R>,
}

impl<R: role::RoleMarker> FromRequestParts<AppState> for RequiresRole<R> {
    type Rejection = Error;

    #[instrument(skip_all, fields(required = %R::ROLE))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        let role_id = authorize(&user, R::ROLE)?;

        Ok(Self {
            user,
            role_id,
            _role: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::RoleDetail;
    use crate::errors::AuthRejection;
    use crate::test_utils::{create_test_state, create_test_user, session_token};
    use axum::http::{StatusCode, header::AUTHORIZATION};
    use sqlx::PgPool;

    fn user(role: RoleDetail) -> CurrentUser {
        CurrentUser {
            id: 1,
            email: "u@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_authorize_matching_role() {
        assert_eq!(authorize(&user(RoleDetail::Teacher(9)), Role::Teacher).unwrap(), 9);
        assert_eq!(user(RoleDetail::Principal(2)).require(Role::Principal).unwrap(), 2);
    }

    #[test]
    fn test_authorize_wrong_role_is_forbidden() {
        for required in [Role::Teacher, Role::Principal] {
            let err = authorize(&user(RoleDetail::Student(1)), required).unwrap_err();
            assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
            assert_eq!(err.user_message(), "You do not have permission to perform this action");
        }
    }

    fn parts_with_token(token: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().uri("http://localhost/test");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let (parts, _body) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[sqlx::test]
    async fn test_extractor_checks_role_after_authentication(pool: PgPool) {
        let state = create_test_state(pool.clone());
        let teacher = create_test_user(&pool, Role::Teacher).await;
        let token = session_token(&teacher, &state.config);

        let mut parts = parts_with_token(Some(&token));
        let granted = RequiresRole::<role::Teacher>::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(granted.user.id, teacher.id);
        assert_eq!(granted.role_id, teacher.role.id());

        let mut parts = parts_with_token(Some(&token));
        let denied = RequiresRole::<role::Student>::from_request_parts(&mut parts, &state).await;
        assert!(matches!(denied, Err(Error::InsufficientRole { required: Role::Student })));

        // No credentials is a 401, not a 403
        let mut parts = parts_with_token(None);
        let anonymous = RequiresRole::<role::Student>::from_request_parts(&mut parts, &state).await;
        assert!(matches!(
            anonymous,
            Err(Error::Unauthenticated {
                reason: AuthRejection::NoToken
            })
        ));
    }
}
