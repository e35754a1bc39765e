/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskdesk_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskdesk_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Config;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets the secret used to verify access tokens
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /v1/                             # API v1 (versioned)
///     ├── /accounts/                   # User accounts
///     │   ├── POST   /                 # Create account (admin)
///     │   ├── GET    /                 # List accounts
///     │   ├── GET    /:id              # Retrieve account
///     │   ├── PUT    /:id              # Update credentials (admin/self)
///     │   ├── PATCH  /:id              # Update credentials (admin/self)
///     │   └── DELETE /:id              # Delete account (admin/self)
///     └── /tasks/                      # Tasks
///         ├── POST   /                 # Create task
///         ├── GET    /                 # List task projections
///         ├── GET    /:id              # Retrieve task projection
///         ├── PUT    /:id              # Update task (admin/owner/member)
///         ├── PATCH  /:id              # Update task (admin/owner/member)
///         ├── PATCH  /:id/team-members # Batch add members (admin/owner)
///         └── DELETE /:id/team-members # Remove one member (admin/owner)
/// ```
///
/// Authentication is not a router-level gate: every handler extracts an
/// [`crate::extract::AuthPrincipal`] and asks the policy engine, so the
/// 401/403 split and per-object visibility stay in one place.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let account_routes = Router::new()
        .route(
            "/",
            post(routes::accounts::create_account).get(routes::accounts::list_accounts),
        )
        .route(
            "/:id",
            get(routes::accounts::get_account)
                .put(routes::accounts::update_account)
                .patch(routes::accounts::update_account)
                .delete(routes::accounts::delete_account),
        );

    let task_routes = Router::new()
        .route(
            "/",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .patch(routes::tasks::update_task),
        )
        .route(
            "/:id/team-members",
            patch(routes::tasks::add_team_members).delete(routes::tasks::remove_team_member),
        );

    let v1_routes = Router::new()
        .nest("/accounts", account_routes)
        .nest("/tasks", task_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
