use std::sync::Arc;

use axum::{
    Form, Json,
    extract::Extension,
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};

use epm_auth::{LoginRequest, Notice, RegistrationRequest};
use epm_infra::ServiceError;

use crate::app::dto::FormView;
use crate::app::errors::service_error_to_response;
use crate::app::routes::{redirect_with_notice, redirect_with_visitor_notice, take_notices};
use crate::app::services::AppServices;
use crate::context::SessionContext;
use crate::middleware::session_cookie;

pub async fn login_page(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
) -> Response {
    if ctx.is_authenticated() {
        return Redirect::to("/home").into_response();
    }
    Json(FormView::new("login", take_notices(&services, &ctx))).into_response()
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
    Form(req): Form<LoginRequest>,
) -> Response {
    if ctx.is_authenticated() {
        return Redirect::to("/home").into_response();
    }

    match services.auth.login(req).await {
        Ok(session) => {
            // A fresh id replaces whatever anonymous id the browser had.
            if let Some(previous) = ctx.session_id() {
                services.auth.logout(previous);
            }
            let cookie = session_cookie(&services.signer, &session, services.secure_cookies);
            ([(header::SET_COOKIE, cookie)], Redirect::to("/home")).into_response()
        }
        Err(ServiceError::Validation(errors)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(FormView::new("login", take_notices(&services, &ctx)).with_errors(errors)),
        )
            .into_response(),
        Err(err @ ServiceError::InvalidCredentials) => {
            let mut notices = take_notices(&services, &ctx);
            notices.push(Notice::danger(err.to_string()));
            (StatusCode::UNAUTHORIZED, Json(FormView::new("login", notices))).into_response()
        }
        Err(err) => service_error_to_response(err),
    }
}

pub async fn register_page(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
) -> Response {
    Json(FormView::new("register", take_notices(&services, &ctx))).into_response()
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
    Form(req): Form<RegistrationRequest>,
) -> Response {
    match services.auth.register(req).await {
        Ok(_employee) => redirect_with_notice(
            &services,
            &ctx,
            Notice::success("Your account has been created! You can now log in."),
            "/login",
        ),
        Err(ServiceError::Validation(errors)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(FormView::new("register", take_notices(&services, &ctx)).with_errors(errors)),
        )
            .into_response(),
        Err(
            err @ (ServiceError::DuplicateEmail
            | ServiceError::DuplicateUsername
            | ServiceError::DuplicateEmployeeNumber),
        ) => {
            let mut notices = take_notices(&services, &ctx);
            notices.push(Notice::danger(err.to_string()));
            (StatusCode::CONFLICT, Json(FormView::new("register", notices))).into_response()
        }
        Err(err) => service_error_to_response(err),
    }
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
) -> Response {
    if let Some(id) = ctx.session_id() {
        services.auth.logout(id);
    }
    redirect_with_visitor_notice(&services, Notice::info("You have been logged out."), "/login")
}
