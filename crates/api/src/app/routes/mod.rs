use axum::{
    Router,
    http::header,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};

use epm_auth::{Notice, SessionId};

use crate::app::services::AppServices;
use crate::context::SessionContext;
use crate::middleware::visitor_cookie;

pub mod auth;
pub mod reviews;
pub mod system;

/// Routes reachable without a session.
pub fn public_router() -> Router {
    Router::new()
        .route("/", get(auth::login_page))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
}

/// Routes that require an authenticated identity.
pub fn protected_router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/logout", post(auth::logout))
        .route("/home", get(reviews::home))
        .route(
            "/create-review",
            get(reviews::create_review_page).post(reviews::create_review),
        )
        .route(
            "/edit-review/:review_id",
            get(reviews::edit_review_page).post(reviews::edit_review),
        )
        .route("/delete-review/:review_id", post(reviews::delete_review))
}

/// Drain the notices pending for this request's session, if any.
pub(crate) fn take_notices(services: &AppServices, ctx: &SessionContext) -> Vec<Notice> {
    ctx.session_id()
        .map(|id| services.auth.take_notices(id))
        .unwrap_or_default()
}

/// 303 to `to`, leaving `notice` for the next rendered view.
///
/// A visitor without any session id gets a fresh one in a cookie so the
/// notice survives the redirect.
pub(crate) fn redirect_with_notice(
    services: &AppServices,
    ctx: &SessionContext,
    notice: Notice,
    to: &str,
) -> Response {
    match ctx.session_id() {
        Some(id) => {
            services.auth.notify(id, notice);
            Redirect::to(to).into_response()
        }
        None => redirect_with_visitor_notice(services, notice, to),
    }
}

pub(crate) fn redirect_with_visitor_notice(
    services: &AppServices,
    notice: Notice,
    to: &str,
) -> Response {
    let id = SessionId::generate();
    services.auth.notify(&id, notice);
    let cookie = visitor_cookie(&services.signer, &id, services.secure_cookies);
    ([(header::SET_COOKIE, cookie)], Redirect::to(to)).into_response()
}
