//! API routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, AppState};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health))

        // Monitor
        .route("/api/v1/check", post(handlers::run_check))
        .route("/api/v1/status", get(handlers::status))

        // Settings
        .route(
            "/api/v1/settings",
            get(handlers::get_settings).put(handlers::put_settings),
        )

        // Credentials
        .route(
            "/api/v1/credentials",
            get(handlers::list_credentials).put(handlers::upsert_credential),
        )
        .route(
            "/api/v1/credentials/:credential_id/activate",
            post(handlers::activate_credential),
        )

        .with_state(state)
}
