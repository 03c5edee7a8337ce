//! Route gate: redirects page navigations based on authentication state.
//!
//! Protected pages require a valid session cookie; auth pages (login,
//! register) bounce already-authenticated users to the chat page. API and
//! asset paths pass through untouched. The decision itself is a pure
//! function of (path class, verification result).

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use crate::session::{self, SESSION_COOKIE};
use crate::AppState;

/// Where authenticated users land, and what the gate protects.
pub const HOME_PATH: &str = "/chat";
/// Where unauthenticated users are sent.
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Requires a valid session
    Protected,
    /// Login/register pages, for unauthenticated users only
    AuthOnly,
    /// Everything else, API routes included
    Public,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    Continue,
    RedirectLogin,
    RedirectHome,
}

pub fn classify(path: &str) -> RouteClass {
    if path == HOME_PATH || path.starts_with("/chat/") {
        RouteClass::Protected
    } else if path == LOGIN_PATH || path == "/register" {
        RouteClass::AuthOnly
    } else {
        RouteClass::Public
    }
}

pub fn decide(class: RouteClass, authenticated: bool) -> GateAction {
    match class {
        RouteClass::Protected if !authenticated => GateAction::RedirectLogin,
        RouteClass::AuthOnly if authenticated => GateAction::RedirectHome,
        _ => GateAction::Continue,
    }
}

pub async fn gate_middleware(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request<Body>,
    next: Next,
) -> Response {
    let authenticated = jar
        .get(SESSION_COOKIE)
        .map(|cookie| session::verify(cookie.value(), &state.config.auth.jwt_secret).is_ok())
        .unwrap_or(false);

    match decide(classify(request.uri().path()), authenticated) {
        GateAction::Continue => next.run(request).await,
        GateAction::RedirectLogin => Redirect::to(LOGIN_PATH).into_response(),
        GateAction::RedirectHome => Redirect::to(HOME_PATH).into_response(),
    }
}
