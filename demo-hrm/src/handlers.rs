use askama::Template;
use axum::{
    Extension, Form, Router,
    http::StatusCode,
    middleware::from_fn,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use hrm_session_axum::{
    AppModule, GuardStatus, HRM_SESSION_ROUTE_PREFIX, IntoResponseError, prepare_login_headers,
    session_guard,
};

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate<'a> {
    title: &'a str,
    login_route: &'a str,
    register_route: &'a str,
    message: &'a str,
}

#[derive(Template)]
#[template(path = "register.html")]
struct RegisterTemplate<'a> {
    title: &'a str,
    login_route: &'a str,
}

#[derive(Template)]
#[template(path = "page.html")]
struct PageTemplate<'a> {
    title: &'a str,
    module: &'a str,
    remaining_secs: i64,
    limit_secs: u64,
    login_route: &'a str,
    session_prefix: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginForm {
    username: String,
    #[allow(dead_code)]
    password: String,
}

/// Login, register and one protected page per module, all behind the guard
pub(crate) fn router() -> Router {
    let mut router = Router::new();
    for module in AppModule::ALL {
        router = router
            .route(
                module.login_route(),
                get(move || login_page(module, ""))
                    .post(move |Form(form): Form<LoginForm>| login_submit(module, form)),
            )
            .route(module.register_route(), get(move || register_page(module)))
            .route(landing_route(module), get(protected_page));
    }
    router.route_layer(from_fn(session_guard))
}

fn title(module: AppModule) -> &'static str {
    match module {
        AppModule::Hrm => "Human Resource Management",
        AppModule::Administrative => "Administrative Services",
        AppModule::SelfService => "Employee Self-Service",
    }
}

fn landing_route(module: AppModule) -> &'static str {
    match module {
        AppModule::Hrm => "/hrm/employees",
        AppModule::Administrative => "/admin/dashboard",
        AppModule::SelfService => "/employee/leave",
    }
}

fn render<T: Template>(template: T) -> Result<Html<String>, (StatusCode, String)> {
    template
        .render()
        .map(Html)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

async fn login_page(
    module: AppModule,
    message: &'static str,
) -> Result<Html<String>, (StatusCode, String)> {
    render(LoginTemplate {
        title: title(module),
        login_route: module.login_route(),
        register_route: module.register_route(),
        message,
    })
}

async fn login_submit(
    module: AppModule,
    form: LoginForm,
) -> Result<Response, (StatusCode, String)> {
    if form.username.trim().is_empty() {
        let page = login_page(module, "Please enter your username.").await?;
        return Ok((StatusCode::BAD_REQUEST, page).into_response());
    }

    // Demo backend: every non-empty username is accepted
    let token = Uuid::new_v4().to_string();
    let headers = prepare_login_headers(Some(&token)).into_response_error()?;
    tracing::info!("User {} logged in to {:?}", form.username.trim(), module);

    Ok((headers, Redirect::to(landing_route(module))).into_response())
}

async fn register_page(module: AppModule) -> Result<Html<String>, (StatusCode, String)> {
    render(RegisterTemplate {
        title: title(module),
        login_route: module.login_route(),
    })
}

async fn protected_page(
    Extension(status): Extension<GuardStatus>,
) -> Result<Html<String>, (StatusCode, String)> {
    tracing::trace!("Rendering protected page: {:?}", status);
    render(PageTemplate {
        title: title(status.module),
        module: status.module.key(),
        remaining_secs: status.remaining_ms / 1000,
        limit_secs: status.inactivity_limit_secs,
        login_route: status.module.login_route(),
        session_prefix: HRM_SESSION_ROUTE_PREFIX.as_str(),
    })
}
