//! # gradeflow: role-scoped assignment workflow
//!
//! `gradeflow` is an HTTP service where students write assignments, teachers grade them and
//! principals oversee the whole school. Every request after login carries a signed session token;
//! every mutation is an atomic state transition that checks role, ownership and state in one
//! conditional update.
//!
//! ## Architecture
//!
//! The service is built on [Axum](https://github.com/tokio-rs/axum) and PostgreSQL.
//!
//! ### Request Flow
//!
//! A request to a role surface (for example `POST /api/v1/teacher/assignments/grade`) goes through:
//!
//! 1. The [`RequiresRole`](auth::permissions::RequiresRole) extractor: bearer token extraction,
//!    signature and expiry check, revocation check, identity lookup, role check.
//! 2. The handler in [`api::handlers`], which checks required fields.
//! 3. An operation in [`workflow`], which validates content and referenced users and then runs one
//!    conditional `UPDATE ... RETURNING` through the repositories in [`db`].
//!
//! ### Core Components
//!
//! - **API layer** ([`api`]): handlers and wire models for the `/api/v1` surface.
//! - **Authentication** ([`auth`]): Argon2id passwords, HS256 session tokens, the revocation list
//!   and its reaper, and role extractors.
//! - **Workflow** ([`workflow`]): the assignment state machine.
//! - **Database** ([`db`]): repositories over runtime-checked sqlx queries.
//!
//! **Background services** run alongside the HTTP server. Currently that is the reaper that deletes
//! lapsed entries from the revocation list.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use gradeflow::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = gradeflow::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     gradeflow::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations run automatically on startup; they can also be run by hand:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! gradeflow::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
mod error_detail;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod types;
pub mod workflow;

#[cfg(test)]
pub mod test_utils;

use crate::{config::CorsOrigin, error_detail::error_detail_middleware, openapi::ApiDoc};
use axum::{
    Json, Router, ServiceExt,
    http::{self, HeaderValue},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::{CancellationToken, DropGuard};
use tower::Layer;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{AssignmentId, RoleScopedId, UserId};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder().db(pool).config(config).build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the gradeflow database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Connect to the configured database and bring its schema up to date
#[instrument(skip_all)]
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let settings = &config.database.pool;
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(non_zero_secs(settings.idle_timeout_secs))
        .max_lifetime(non_zero_secs(settings.max_lifetime_secs))
        .connect(&config.database.url)
        .await?;

    migrator().run(&pool).await?;
    info!("Database migrations applied");

    Ok(pool)
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let allowed = &config.auth.security.cors.allowed_origins;
    let allow_origin = if allowed.iter().any(|origin| matches!(origin, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in allowed {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PUT])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_credentials(config.auth.security.cors.allow_credentials);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
///
/// - `/api/v1`: index, auth and the three role surfaces
/// - `/healthz`, `/openapi.json` and `/docs`
/// - `/internal/metrics` when metrics are enabled
///
/// CORS, error detail (development only) and HTTP tracing layers wrap everything.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        .route("/", get(api::handlers::index::index))
        // Authentication
        .route("/auth/register", post(api::handlers::auth::register))
        .route("/auth/login", post(api::handlers::auth::login))
        .route("/auth/logout", post(api::handlers::auth::logout))
        // Students
        .route(
            "/student/assignments",
            get(api::handlers::students::list_assignments)
                .post(api::handlers::students::create_assignment)
                .put(api::handlers::students::edit_assignment),
        )
        .route("/student/assignments/submit", post(api::handlers::students::submit_assignment))
        // Teachers
        .route(
            "/teacher/assignments",
            get(api::handlers::teachers::list_assignments).post(api::handlers::teachers::create_assignment),
        )
        .route("/teacher/assignments/grade", post(api::handlers::teachers::grade_assignment))
        // Principals
        .route("/principal/assignments", get(api::handlers::principals::list_assignments))
        .route("/principal/assignments/grade", post(api::handlers::principals::regrade_assignment))
        .route("/principal/teachers", get(api::handlers::principals::list_teachers))
        .route("/principal/reports/grades", get(api::handlers::principals::grade_report))
        .route("/principal/reports/top-a-grader", get(api::handlers::principals::top_a_grader_report))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let mut router = router
        .layer(from_fn_with_state(state.clone(), error_detail_middleware))
        .layer(create_cors_layer(&state.config)?);

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Strip trailing slashes before routing, so `/api/v1/student/assignments/` reaches the same handler
fn normalize_paths(router: Router) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router)
}

/// Container for background services and their lifecycle management.
///
/// When dropped, the `drop_guard` cancels the shutdown token, signalling all tasks to stop.
pub struct BackgroundServices {
    background_tasks: Vec<tokio::task::JoinHandle<()>>,
    shutdown_token: CancellationToken,
    // Pub so that we can disarm it if we want to
    pub drop_guard: Option<DropGuard>,
}

impl BackgroundServices {
    /// Gracefully shutdown all background tasks
    pub async fn shutdown(self) {
        self.shutdown_token.cancel();

        for handle in self.background_tasks {
            let _ = handle.await;
        }
    }
}

fn setup_background_services(pool: PgPool, config: &Config, shutdown_token: CancellationToken) -> BackgroundServices {
    let drop_guard = shutdown_token.clone().drop_guard();
    let mut background_tasks = Vec::new();

    let reaper_shutdown = shutdown_token.clone();
    let reap_interval = config.revocation.reap_interval;
    background_tasks.push(tokio::spawn(auth::revocation::run_reaper(pool, reap_interval, reaper_shutdown)));

    BackgroundServices {
        background_tasks,
        shutdown_token,
        drop_guard: Some(drop_guard),
    }
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects, runs migrations and starts background services
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: when the shutdown future resolves, stops background tasks and closes the pool
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
    bg_services: BackgroundServices,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Like [`Application::new`], but reuse an existing pool when one is given
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting gradeflow with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => {
                migrator().run(&pool).await?;
                pool
            }
            None => setup_database(&config).await?,
        };

        let bg_services = setup_background_services(pool.clone(), &config, CancellationToken::new());

        let app_state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(&app_state)?;

        Ok(Self {
            router,
            config,
            pool,
            bg_services,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> (axum_test::TestServer, BackgroundServices) {
        let service = ServiceExt::<axum::extract::Request>::into_make_service(normalize_paths(self.router));
        let server = axum_test::TestServer::new(service).expect("Failed to create test server");
        (server, self.bg_services)
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "gradeflow listening on http://{}, docs at http://localhost:{}/docs",
            bind_addr, self.config.port
        );

        let service = ServiceExt::<axum::extract::Request>::into_make_service(normalize_paths(self.router));
        axum::serve(listener, service)
            .with_graceful_shutdown(shutdown)
            .await?;

        self.bg_services.shutdown().await;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
