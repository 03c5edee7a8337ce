pub mod auth;
mod chat;
mod error;
pub mod gate;
mod validation;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session_check));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .route("/chat", post(chat::relay));

    // Front-end pages come from the built SPA, with index.html as fallback
    // so client-side routes resolve on hard navigation.
    let static_dir = state.config.server.static_dir.clone();
    let serve_static =
        ServeDir::new(&static_dir).not_found_service(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .fallback_service(serve_static)
        // The gate sees every request; API and asset paths classify as
        // public and pass through.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::gate_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
