//! Fixtures shared by the unit and HTTP tests.

use crate::{
    AppState, BackgroundServices,
    api::models::users::{CurrentUser, Role},
    auth::{
        password::{self, Argon2Params},
        session,
    },
    config::{Config, DatabaseConfig, PasswordConfig, PoolSettings},
    db::{
        handlers::{Users, repository::Repository},
        models::users::{UserCreateDBRequest, UserDBResponse},
    },
};
use axum_test::TestServer;
use sqlx::PgPool;
use uuid::Uuid;

/// Password given to every fixture user
pub const TEST_PASSWORD: &str = "password123";

/// Argon2 cost low enough to keep registration and login tests fast
fn fast_argon2() -> Argon2Params {
    Argon2Params {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn create_test_config() -> Config {
    let argon2 = fast_argon2();

    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        // The Prometheus recorder is process-global
        enable_metrics: false,
        database: DatabaseConfig {
            pool: PoolSettings {
                max_connections: 4,
                min_connections: 0,
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    };
    config.auth.password = PasswordConfig {
        min_length: 6,
        max_length: 64,
        argon2_memory_kib: argon2.memory_kib,
        argon2_iterations: argon2.iterations,
        argon2_parallelism: argon2.parallelism,
    };
    config
}

pub fn create_test_state(pool: PgPool) -> AppState {
    AppState::builder().db(pool).config(create_test_config()).build()
}

pub async fn create_test_app(pool: PgPool) -> (TestServer, BackgroundServices) {
    let app = crate::Application::new_with_pool(create_test_config(), Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

/// Insert a user with a unique email and [`TEST_PASSWORD`].
pub async fn create_test_user(pool: &PgPool, role: Role) -> UserDBResponse {
    let email = format!("{}-{}@example.com", role, Uuid::new_v4().simple());
    let password_hash = password::hash_string_with_params(TEST_PASSWORD, Some(fast_argon2())).expect("Failed to hash password");

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Users::new(&mut conn)
        .create(&UserCreateDBRequest { email, password_hash, role })
        .await
        .expect("Failed to create test user")
}

/// Session token for `user`, signed with `config`'s secret.
pub fn session_token(user: &UserDBResponse, config: &Config) -> String {
    session::create_session_token(&CurrentUser::from(user.clone()), config).expect("Failed to create session token")
}
