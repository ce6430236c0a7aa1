//! Server-side evaluation of the session guard
//!
//! A request carries the cookie mirror only; there is no key/value store on
//! the server, so the last-activity timestamp is read from its cookie.

use std::sync::Arc;

use axum_extra::headers::Cookie;
use http::HeaderMap;
use serde::Serialize;

use hrm_session::{
    ActivityMonitor, AppModule, Clock, GuardConfig, GuardState, HeaderCookieJar, NoStorage,
    Observation, PersistentSessionStore, RecordingNavigator, SessionError, Trigger,
};

/// Session summary handed to handlers and served by the status endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardStatus {
    pub logged_in: bool,
    pub module: AppModule,
    pub idle_ms: i64,
    pub remaining_ms: i64,
    pub inactivity_limit_secs: u64,
}

impl GuardStatus {
    pub(crate) fn new(observation: &Observation, module: AppModule, config: &GuardConfig) -> Self {
        let limit_ms = config.inactivity_limit_millis();
        let idle_ms = observation.idle_ms();
        let logged_in = observation.logged_in && idle_ms <= limit_ms;

        let (idle_ms, remaining_ms) = if logged_in {
            (idle_ms, (limit_ms - idle_ms).max(0))
        } else {
            (0, 0)
        };

        Self {
            logged_in,
            module,
            idle_ms,
            remaining_ms,
            inactivity_limit_secs: config.inactivity_limit_secs,
        }
    }
}

/// Result of guarding one request
#[derive(Debug)]
pub(crate) struct GuardOutcome {
    pub(crate) state: GuardState,
    pub(crate) redirect: Option<String>,
    pub(crate) status: GuardStatus,
    pub(crate) set_cookies: HeaderMap,
}

pub(crate) fn request_jar(
    cookie: Option<&Cookie>,
    clock: &Arc<dyn Clock>,
    secure: bool,
) -> Arc<HeaderCookieJar> {
    Arc::new(HeaderCookieJar::from_cookie(cookie, Arc::clone(clock), secure))
}

pub(crate) fn request_store(
    jar: &Arc<HeaderCookieJar>,
    config: &GuardConfig,
) -> Arc<PersistentSessionStore> {
    Arc::new(PersistentSessionStore::new(
        jar.clone(),
        Arc::new(NoStorage),
        config.inactivity_limit_secs,
    ))
}

/// Run the mount check for `path` against the request cookies
#[tracing::instrument(skip(cookie, clock, config))]
pub(crate) fn check_request(
    cookie: Option<&Cookie>,
    path: &str,
    clock: Arc<dyn Clock>,
    config: Arc<GuardConfig>,
    secure: bool,
) -> Result<GuardOutcome, SessionError> {
    let jar = request_jar(cookie, &clock, secure);
    let store = request_store(&jar, &config);
    let navigator = Arc::new(RecordingNavigator::new());
    let monitor = ActivityMonitor::new(store, clock, navigator.clone(), config, path);

    let state = monitor.evaluate(&Trigger::Mount);
    let status = GuardStatus::new(&monitor.observe(), monitor.module(), monitor.config());
    tracing::debug!("Guard state for {}: {:?}", path, state);

    Ok(GuardOutcome {
        state,
        redirect: navigator.last_redirect(),
        status,
        set_cookies: jar.set_cookie_headers()?,
    })
}

/// Current status for `module` without extending the session
pub(crate) fn read_status(
    cookie: Option<&Cookie>,
    module: AppModule,
    clock: Arc<dyn Clock>,
    config: Arc<GuardConfig>,
) -> GuardStatus {
    let jar = request_jar(cookie, &clock, false);
    let store = request_store(&jar, &config);
    let monitor = ActivityMonitor::new(
        store,
        clock,
        Arc::new(RecordingNavigator::new()),
        config,
        module.prefix(),
    );
    GuardStatus::new(&monitor.observe(), module, monitor.config())
}
