//! Compiled-in guard configuration

use std::time::Duration;

use crate::routes::PublicPageSet;

/// Seconds of inactivity after which a session is forcibly ended.
pub const INACTIVITY_LIMIT_SECS: u64 = 60;

/// Period of the background validity check while a page is mounted.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Cookie and storage key of the "is logged in" flag.
pub const FLAG_KEY: &str = "isLoggedIn";

/// Cookie and storage key of the last-activity timestamp (epoch milliseconds).
pub const LAST_ACTIVITY_KEY: &str = "lastActivity";

/// Cookie and storage key of the access token placeholder.
pub const TOKEN_KEY: &str = "token";

/// The only flag value that counts as logged in.
pub const TRUE_SENTINEL: &str = "true";

/// Every cookie name owned by the guard.
pub(crate) const OWNED_COOKIES: [&str; 3] = [FLAG_KEY, LAST_ACTIVITY_KEY, TOKEN_KEY];

/// Runtime view of the guard constants.
///
/// `GuardConfig::default()` is what production pages use. Tests and demos may
/// shorten the limit or the tick period, but nothing mutates a config once a
/// gate has been built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    pub inactivity_limit_secs: u64,
    pub tick_interval: Duration,
    pub public_pages: PublicPageSet,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            inactivity_limit_secs: INACTIVITY_LIMIT_SECS,
            tick_interval: TICK_INTERVAL,
            public_pages: PublicPageSet::default(),
        }
    }
}

impl GuardConfig {
    pub fn with_inactivity_limit(mut self, secs: u64) -> Self {
        self.inactivity_limit_secs = secs;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_public_pages(mut self, public_pages: PublicPageSet) -> Self {
        self.public_pages = public_pages;
        self
    }

    pub fn inactivity_limit_millis(&self) -> i64 {
        (self.inactivity_limit_secs as i64).saturating_mul(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_constants() {
        let config = GuardConfig::default();

        assert_eq!(config.inactivity_limit_secs, 60);
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.inactivity_limit_millis(), 60_000);
    }

    #[test]
    fn test_builder_overrides() {
        let config = GuardConfig::default()
            .with_inactivity_limit(5)
            .with_tick_interval(Duration::from_millis(250));

        assert_eq!(config.inactivity_limit_millis(), 5_000);
        assert_eq!(config.tick_interval, Duration::from_millis(250));
        // Public pages are untouched by the other builders
        assert!(config.public_pages.contains("/hrm/login"));
    }

    #[test]
    fn test_owned_cookies_cover_every_key() {
        assert!(OWNED_COOKIES.contains(&FLAG_KEY));
        assert!(OWNED_COOKIES.contains(&LAST_ACTIVITY_KEY));
        assert!(OWNED_COOKIES.contains(&TOKEN_KEY));
    }
}
