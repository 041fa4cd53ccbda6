use axum::{
    Json,
    Router,
    extract::State,
    http::HeaderValue,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccountService, SeaOrmAccountService, SeaOrmTokenService, TokenService,
};

mod accounts;
pub mod auth;
mod error;
mod tokens;
mod types;

pub use error::ApiError;
pub use types::*;

pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub accounts: Arc<dyn AccountService>,

    pub tokens: Arc<dyn TokenService>,

    pub start_time: std::time::Instant,
}

/// Build the full application state from config: connects the store (running
/// pending migrations) and wires the services around it.
pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::new(
        &config.general.database_path,
        std::path::Path::new(&config.general.migrations_dir),
    )
    .await?;

    Ok(create_app_state(config, store))
}

#[must_use]
pub fn create_app_state(config: Config, store: Store) -> Arc<AppState> {
    let accounts: Arc<dyn AccountService> = Arc::new(SeaOrmAccountService::new(
        store.clone(),
        config.security.clone(),
    ));
    let tokens: Arc<dyn TokenService> = Arc::new(SeaOrmTokenService::new(
        store.clone(),
        config.security.clone(),
    ));

    Arc::new(AppState {
        config,
        store,
        accounts,
        tokens,
        start_time: std::time::Instant::now(),
    })
}

#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();
    let secure_cookies = state.config.server.secure_cookies;

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(60)));

    let api_router = Router::new()
        .route("/health", get(health))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::get_current_account))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/tokens/approve", post(tokens::redeem_approval))
        .route("/accounts", post(accounts::create_sub_account))
        .route("/accounts/{id}/approve", post(accounts::approve_account))
        .route("/candidates", post(accounts::create_candidate))
        .route("/candidates", get(accounts::list_candidates))
        .layer(session_layer)
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_seconds: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthResponse>> {
    let status = match state.store.ping().await {
        Ok(()) => "ok",
        Err(_) => "degraded",
    };

    Json(ApiResponse::success(HealthResponse {
        status,
        uptime_seconds: state.start_time.elapsed().as_secs(),
    }))
}
