//! Session endpoints for page scripts

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Query,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::{TypedHeader, headers::Cookie};
use http::StatusCode;
use serde::Deserialize;

use hrm_session::{AppModule, SystemClock};

use super::config::GUARD_CONFIG;
use super::error::IntoResponseError;
use super::guard::{GuardStatus, read_status};
use super::session::prepare_logout_headers;

/// Router with the session endpoints, meant to be nested at
/// [`HRM_SESSION_ROUTE_PREFIX`](crate::HRM_SESSION_ROUTE_PREFIX):
/// - `GET /status?module=hrm` - read-only session summary
/// - `POST /logout?module=hrm` - clear the session and go to the module login
///
/// Do not put [`session_guard`](crate::session_guard) in front of it, or
/// polling the status would count as user activity.
pub fn session_router() -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModuleQuery {
    module: Option<AppModule>,
}

impl ModuleQuery {
    fn module(&self) -> AppModule {
        self.module.unwrap_or(AppModule::Hrm)
    }
}

async fn status(
    Query(query): Query<ModuleQuery>,
    cookie: Option<TypedHeader<Cookie>>,
) -> Json<GuardStatus> {
    let cookie = cookie.map(|TypedHeader(cookie)| cookie);
    Json(read_status(
        cookie.as_ref(),
        query.module(),
        Arc::new(SystemClock),
        Arc::clone(&GUARD_CONFIG),
    ))
}

async fn logout(Query(query): Query<ModuleQuery>) -> Result<Response, (StatusCode, String)> {
    let headers = prepare_logout_headers().into_response_error()?;
    let target = query.module().login_route();
    tracing::info!("Logout requested, redirecting to {}", target);
    Ok((headers, Redirect::to(target)).into_response())
}
