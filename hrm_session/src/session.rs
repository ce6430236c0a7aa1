use crate::clock::Clock;
use crate::config::GuardConfig;
use crate::storage::SessionStore;

/// Record a successful login.
///
/// Sets the session flag, stamps the current time as last activity and, when
/// the backend handed out an access token, keeps it next to the flag.
#[tracing::instrument(skip_all)]
pub fn begin_session(
    store: &dyn SessionStore,
    clock: &dyn Clock,
    config: &GuardConfig,
    token: Option<&str>,
) {
    let ttl_secs = config.inactivity_limit_secs;
    store.set_flag(true, ttl_secs);
    if let Some(token) = token {
        store.set_token(token, ttl_secs);
    }
    store.set_timestamp(clock.now_millis());
    tracing::info!("Session started");
}

/// Forget the session without navigating anywhere
pub fn end_session(store: &dyn SessionStore) {
    store.clear_all();
    tracing::info!("Session ended");
}
