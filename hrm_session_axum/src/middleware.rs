use std::sync::Arc;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::headers::{Cookie, HeaderMapExt};
use http::HeaderMap;
use http::header::SET_COOKIE;

use hrm_session::{Clock, SystemClock};

use super::config::{GUARD_CONFIG, HRM_COOKIE_SECURE};
use super::guard::check_request;

fn append_set_cookies(mut response: Response, set_cookies: &HeaderMap) -> Response {
    for value in set_cookies.get_all(SET_COOKIE) {
        response.headers_mut().append(SET_COOKIE, value.clone());
    }
    response
}

/// Session guard for every page behind it.
///
/// Valid sessions are extended and the handler receives a
/// [`GuardStatus`](crate::GuardStatus) extension. Invalid ones get their
/// cookies cleared and are redirected to the module login page (GET) or
/// answered with 401 (other methods).
pub async fn session_guard(mut req: Request, next: Next) -> Response {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cookie = req.headers().typed_get::<Cookie>();
    let path = req.uri().path().to_string();

    let outcome = match check_request(
        cookie.as_ref(),
        &path,
        clock,
        Arc::clone(&GUARD_CONFIG),
        *HRM_COOKIE_SECURE,
    ) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Failed to evaluate session for {}: {}", path, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    match outcome.redirect {
        Some(target) => {
            let response = if req.method() == http::Method::GET {
                tracing::debug!("Redirecting {} to {}", path, target);
                Redirect::temporary(&target).into_response()
            } else {
                tracing::debug!("Unauthorized {} {}", req.method(), path);
                (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
            };
            append_set_cookies(response, &outcome.set_cookies)
        }
        None => {
            tracing::trace!("Session state for {}: {:?}", path, outcome.state);
            req.extensions_mut().insert(outcome.status);
            let response = next.run(req).await;
            append_set_cookies(response, &outcome.set_cookies)
        }
    }
}
