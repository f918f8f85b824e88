use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::handlers;
use crate::middleware::profile_request;
use crate::AppState;

/// Directory served for paths no route matches.
pub const PUBLIC_DIR: &str = "public";

/// Builds the full Axum `Router` with all routes, the profiler, and static serving.
pub fn create_router(state: Arc<AppState>) -> Router {
    let profiler = state.profiler.clone();

    Router::new()
        // ── HTML pages (toolbar injected) ───────────────────────
        .route("/", get(handlers::pages::index))
        .route("/users/:id", get(handlers::pages::show_user))
        // ── JSON API (never touched by the toolbar) ─────────────
        .route("/api/users/:id", get(handlers::users::get_user))
        .route("/api/users", post(handlers::users::create_user))
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Serve public/ for everything else ───────────────────
        .fallback_service(ServeDir::new(PUBLIC_DIR))
        // ── Profile every request, static files included ────────
        .layer(axum_mw::from_fn_with_state(profiler, profile_request))
}
