use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{current_user, google_login, health_check, logout, oauth_callback, AppState};
use super::search_console::{indexing_status, site_analytics};

pub fn create_api_router(state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/google", get(google_login))
        .route("/callback", get(oauth_callback))
        .route("/logout", post(logout))
        .route("/me", get(current_user));

    let search_console_routes = Router::new()
        .route("/analytics", get(site_analytics))
        .route("/indexing-status", get(indexing_status));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/search-console", search_console_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
