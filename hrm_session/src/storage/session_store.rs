use std::sync::Arc;

use crate::config::{FLAG_KEY, LAST_ACTIVITY_KEY, OWNED_COOKIES, TOKEN_KEY, TRUE_SENTINEL};

use super::cookie::CookieJar;
use super::local::KeyValueStore;

/// Login state as seen by the guard.
///
/// Implementations never fail: an unavailable backing store reads as
/// logged out with a zero timestamp and ignores writes.
pub trait SessionStore: Send + Sync {
    fn set_flag(&self, logged_in: bool, ttl_secs: u64);

    fn set_timestamp(&self, millis: i64);

    fn set_token(&self, token: &str, ttl_secs: u64);

    fn read_flag(&self) -> bool;

    fn read_timestamp(&self) -> i64;

    fn clear_all(&self);
}

/// Session state mirrored in cookies and key/value storage.
///
/// The cookie decides whether the user is logged in. The key/value store
/// decides the last-activity timestamp, with the cookie as fallback.
pub struct PersistentSessionStore {
    cookies: Arc<dyn CookieJar>,
    storage: Arc<dyn KeyValueStore>,
    cookie_ttl_secs: u64,
}

impl PersistentSessionStore {
    /// `cookie_ttl_secs` is the lifetime given to the timestamp cookie on
    /// every write, normally the inactivity limit.
    pub fn new(
        cookies: Arc<dyn CookieJar>,
        storage: Arc<dyn KeyValueStore>,
        cookie_ttl_secs: u64,
    ) -> Self {
        Self {
            cookies,
            storage,
            cookie_ttl_secs,
        }
    }
}

fn flag_value(logged_in: bool) -> &'static str {
    if logged_in { TRUE_SENTINEL } else { "false" }
}

impl SessionStore for PersistentSessionStore {
    fn set_flag(&self, logged_in: bool, ttl_secs: u64) {
        let value = flag_value(logged_in);
        self.cookies.set(FLAG_KEY, value, ttl_secs);
        self.storage.set_item(FLAG_KEY, value);

        if let Some(token) = self.cookies.get(TOKEN_KEY) {
            self.cookies.set(TOKEN_KEY, &token, ttl_secs);
        }
    }

    fn set_timestamp(&self, millis: i64) {
        let value = millis.to_string();
        self.cookies
            .set(LAST_ACTIVITY_KEY, &value, self.cookie_ttl_secs);
        self.storage.set_item(LAST_ACTIVITY_KEY, &value);
    }

    fn set_token(&self, token: &str, ttl_secs: u64) {
        self.cookies.set(TOKEN_KEY, token, ttl_secs);
        self.storage.set_item(TOKEN_KEY, token);
    }

    fn read_flag(&self) -> bool {
        self.cookies.get(FLAG_KEY).as_deref() == Some(TRUE_SENTINEL)
    }

    fn read_timestamp(&self) -> i64 {
        if let Some(millis) = self
            .storage
            .get_item(LAST_ACTIVITY_KEY)
            .and_then(|value| value.parse::<i64>().ok())
        {
            return millis;
        }

        self.cookies
            .get(LAST_ACTIVITY_KEY)
            .and_then(|value| value.parse::<i64>().ok())
            .unwrap_or(0)
    }

    fn clear_all(&self) {
        for name in OWNED_COOKIES {
            self.cookies.remove(name);
        }
        self.storage.clear();
        tracing::debug!("Cleared session cookies and local storage");
    }
}
