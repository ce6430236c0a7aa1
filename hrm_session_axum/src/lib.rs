//! hrm_session_axum - Axum integration for the HRM session guard
//!
//! Provides the [`session_guard`] middleware that checks and extends the
//! session on every page request, header helpers for login and logout
//! handlers, and a small router with status and logout endpoints.

mod config;
mod error;
mod guard;
mod middleware;
mod router;
mod session;

pub use config::{HRM_COOKIE_SECURE, HRM_SESSION_ROUTE_PREFIX};
pub use error::IntoResponseError;
pub use guard::GuardStatus;
pub use middleware::session_guard;
pub use router::session_router;
pub use session::{prepare_login_headers, prepare_logout_headers};

// Re-export the core types handlers usually need
pub use hrm_session::{AppModule, GuardState, PublicPageSet};
