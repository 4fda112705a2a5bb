use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;

use epm_auth::{Session, SessionId, SessionSigner};

use crate::app::errors::internal_error;
use crate::app::services::AppServices;
use crate::context::{SESSION_COOKIE, SessionContext};

/// Resolve the session cookie (if any) into a [`SessionContext`] extension.
///
/// Runs on every route. Missing, unsigned, or expired cookies are not an
/// error here; they simply resolve to an anonymous context.
pub async fn resolve_session(
    State(services): State<Arc<AppServices>>,
    mut req: Request,
    next: Next,
) -> Response {
    let session_id = read_cookie(req.headers(), SESSION_COOKIE)
        .and_then(|value| services.signer.verify(value));

    let identity = match &session_id {
        Some(id) => match services.auth.authenticate(id).await {
            Ok(identity) => identity,
            Err(e) => return internal_error(e),
        },
        None => None,
    };

    req.extensions_mut()
        .insert(SessionContext::new(session_id, identity));
    next.run(req).await
}

/// Gate for protected routes: anonymous requests are sent to the login page,
/// authenticated ones get the [`epm_auth::Identity`] as an extension.
pub async fn require_identity(mut req: Request, next: Next) -> Response {
    let identity = req
        .extensions()
        .get::<SessionContext>()
        .and_then(SessionContext::identity);

    match identity {
        Some(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        None => Redirect::to("/login").into_response(),
    }
}

fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value for an authenticated session.
///
/// A remembered session carries `Max-Age`; otherwise the cookie lasts for
/// the browser session.
pub fn session_cookie(signer: &SessionSigner, session: &Session, secure: bool) -> String {
    let max_age = session
        .remember
        .then(|| session.max_age_secs(Utc::now()));
    build_cookie(&signer.sign(&session.id), max_age, secure)
}

/// `Set-Cookie` value binding an anonymous visitor id, used to carry
/// notices across a redirect.
pub fn visitor_cookie(signer: &SessionSigner, id: &SessionId, secure: bool) -> String {
    build_cookie(&signer.sign(id), None, secure)
}

fn build_cookie(value: &str, max_age: Option<i64>, secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}={value}; HttpOnly; SameSite=Lax; Path=/");
    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Duration;
    use epm_core::EmployeeNumber;

    #[test]
    fn finds_named_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; epm_session=abc.def ; lang=en"),
        );
        assert_eq!(read_cookie(&headers, SESSION_COOKIE), Some("abc.def"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn remembered_sessions_get_max_age() {
        let signer = SessionSigner::new(b"test-secret").unwrap();
        let now = Utc::now();

        let browser = Session::issue(EmployeeNumber::new(202), now, Duration::hours(1), false);
        let cookie = session_cookie(&signer, &browser, false);
        assert!(cookie.starts_with("epm_session="));
        assert!(cookie.contains("HttpOnly; SameSite=Lax; Path=/"));
        assert!(!cookie.contains("Max-Age"));
        assert!(!cookie.contains("Secure"));

        let remembered = Session::issue(EmployeeNumber::new(202), now, Duration::days(30), true);
        let cookie = session_cookie(&signer, &remembered, true);
        assert!(cookie.contains("Max-Age="));
        assert!(cookie.ends_with("; Secure"));
    }
}
