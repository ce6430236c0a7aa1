use axum::{Router, response::Redirect, routing::get};

use hrm_session_axum::{AppModule, HRM_SESSION_ROUTE_PREFIX, session_router};

mod handlers;
mod server;

use crate::server::{init_tracing, spawn_http_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing("demo_hrm");

    let port = std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse::<u16>().ok())
        .unwrap_or(3001);

    let app = Router::new()
        .route(
            "/",
            get(|| async { Redirect::to(AppModule::Hrm.login_route()) }),
        )
        .merge(handlers::router())
        .nest(HRM_SESSION_ROUTE_PREFIX.as_str(), session_router());

    spawn_http_server(port, app).await?;
    Ok(())
}
