//! Homework Board
//!
//! A server-rendered homework bulletin board with an admin panel, backed by
//! SQLite. Readers get live list updates over SSE; admins edit through HTML
//! forms or the JSON API.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod feed;
mod models;
mod panel;
mod render;
mod web;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use feed::{HomeworkFeed, Snapshot, UserDirectory};

/// How often expired sessions are swept from the store.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub feed: Arc<HomeworkFeed>,
    pub users: Arc<UserDirectory>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Load both collections once and wrap them as live feeds.
    pub async fn load(repo: Arc<Repository>, config: Config) -> Result<Self, errors::AppError> {
        let revision = repo.get_revision_id().await?;
        let homework = repo.list_homework().await?;
        let users = repo.list_users().await?;
        tracing::info!(
            revision,
            homework = homework.len(),
            users = users.len(),
            "Loaded initial snapshots"
        );

        Ok(Self {
            repo,
            feed: Arc::new(HomeworkFeed::new(Snapshot::new(revision, homework))),
            users: Arc::new(UserDirectory::new(Snapshot::new(revision, users))),
            config: Arc::new(config),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Homework Board");
    for warning in &config.warnings {
        tracing::warn!("{}", warning);
    }
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_key.is_none() {
        tracing::warn!("No API key configured (HW_API_KEY). API writes need a session.");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    if let Some(admin) = &config.bootstrap_admin {
        auth::bootstrap_admin(&repo, admin).await?;
    }
    let purged = repo.purge_expired_sessions().await?;
    if purged > 0 {
        tracing::info!("Purged {} expired sessions", purged);
    }

    let state = AppState::load(repo, config.clone()).await?;
    spawn_session_purge(Arc::clone(&state.repo));

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn spawn_session_purge(repo: Arc<Repository>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            match repo.purge_expired_sessions().await {
                Ok(0) => {}
                Ok(n) => tracing::info!("Purged {} expired sessions", n),
                Err(e) => tracing::warn!("Session purge failed: {}", e),
            }
        }
    });
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public pages
    let public_pages = Router::new()
        .route("/", get(web::feed_page))
        .route("/homework/{id}", get(web::entry_page))
        .route("/feed/stream", get(web::feed_stream))
        .route("/theme", post(web::toggle_theme))
        .route("/login", get(web::login_page).post(web::login))
        .route("/logout", post(web::logout))
        .route("/health", get(health_check));

    // Admin pages (any signed-in user)
    let admin_pages = Router::new()
        .route("/admin/dashboard", get(web::dashboard))
        .route(
            "/admin/profile",
            get(web::profile_page).post(web::submit_profile),
        )
        .route(
            "/admin/homework",
            get(web::homework_page).post(web::submit_homework),
        )
        .route(
            "/admin/homework/{id}/edit",
            get(web::edit_homework_page).post(web::submit_homework_edit),
        )
        .route(
            "/admin/homework/{id}/delete",
            post(web::submit_homework_delete),
        )
        .route_layer(middleware::from_fn(auth::require_signed_in));

    // Settings pages (super admin only)
    let settings_pages = Router::new()
        .route("/admin/settings", get(web::settings_page))
        .route("/admin/users", post(web::submit_user))
        .route(
            "/admin/users/{email}/edit",
            get(web::edit_user_page).post(web::submit_user_edit),
        )
        .route("/admin/users/{email}/delete", post(web::submit_user_delete))
        .route_layer(middleware::from_fn(auth::require_super_admin_page));

    // API routes
    let api_public = Router::new()
        .route("/revision", get(api::get_revision))
        .route("/homework", get(api::list_homework))
        .route("/homework/{id}", get(api::get_homework))
        .route("/session", get(api::get_session))
        .route("/profile", put(api::update_profile));

    let api_editor = Router::new()
        .route("/homework", post(api::create_homework))
        .route(
            "/homework/{id}",
            put(api::update_homework).delete(api::delete_homework),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_editor,
        ));

    let api_users = Router::new()
        .route("/users", get(api::list_users))
        .route(
            "/users/{email}",
            get(api::get_user)
                .put(api::put_user)
                .delete(api::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_super_admin,
        ));

    let api_routes = api_public.merge(api_editor).merge(api_users);

    Router::new()
        .merge(public_pages)
        .merge(admin_pages)
        .merge(settings_pages)
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::session_gate,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
