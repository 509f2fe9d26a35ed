//! Database repository for users.

use crate::types::{RoleScopedId, UserId};
use crate::{
    api::models::users::Role,
    db::{
        errors::Result,
        handlers::{
            id_counters::{IdCounters, USER_COUNTER},
            repository::Repository,
        },
        models::users::{User, UserCreateDBRequest, UserDBResponse, UserFilter},
    },
};
use sqlx::{Connection, PgConnection};
use tracing::instrument;

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    /// Allocate the global and role-scoped ids and insert the user, all in one transaction.
    ///
    /// A failed insert (e.g. duplicate email) rolls the counters back with it.
    #[instrument(skip(self, request), fields(email = %request.email, role = %request.role), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;

        let user_id = IdCounters::new(&mut tx).next(USER_COUNTER).await?;
        let role_id = IdCounters::new(&mut tx).next(request.role.counter_name()).await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, role, role_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(request.role)
        .bind(role_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(UserDBResponse::from(user))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user.map(UserDBResponse::from))
    }

    #[instrument(skip(self, filter), fields(role = ?filter.role), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let users = match filter.role {
            Some(role) => {
                sqlx::query_as::<_, User>("SELECT * FROM users WHERE role = $1 ORDER BY id")
                    .bind(role)
                    .fetch_all(&mut *self.db)
                    .await?
            }
            None => {
                sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
                    .fetch_all(&mut *self.db)
                    .await?
            }
        };

        Ok(users.into_iter().map(UserDBResponse::from).collect())
    }
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, email), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user.map(UserDBResponse::from))
    }

    /// Look a user up by their role-scoped id, e.g. a teacher by `teacher_id`
    #[instrument(skip(self), err)]
    pub async fn get_by_role_id(&mut self, role: Role, role_id: RoleScopedId) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE role = $1 AND role_id = $2")
            .bind(role)
            .bind(role_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user.map(UserDBResponse::from))
    }
}
