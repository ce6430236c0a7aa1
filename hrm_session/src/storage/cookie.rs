use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Duration;
use headers::{Cookie, HeaderMapExt};
use http::HeaderMap;

use crate::clock::Clock;
use crate::errors::SessionError;
use crate::utils::{header_set_cookie, render_set_cookie};

/// Cookie access for the guard.
///
/// Every cookie written through a jar carries `Path=/` and `SameSite=Lax`.
/// Reads never distinguish a missing cookie from an expired one.
pub trait CookieJar: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;

    fn set(&self, name: &str, value: &str, ttl_secs: u64);

    fn remove(&self, name: &str);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
struct StoredCookie {
    value: String,
    expires_at_ms: i64,
}

/// Profile-wide cookie jar kept in memory.
///
/// Share one jar (behind an `Arc`) between every tab of the same profile.
pub struct MemoryCookieJar {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, StoredCookie>>,
}

impl MemoryCookieJar {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Names of the cookies that are still alive
    pub fn names(&self) -> Vec<String> {
        let now = self.clock.now_millis();
        let mut names: Vec<String> = lock(&self.entries)
            .iter()
            .filter(|(_, cookie)| cookie.expires_at_ms > now)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        let now = self.clock.now_millis();
        let mut entries = lock(&self.entries);
        match entries.get(name) {
            Some(cookie) if cookie.expires_at_ms > now => Some(cookie.value.clone()),
            Some(_) => {
                tracing::trace!("Cookie {} expired", name);
                entries.remove(name);
                None
            }
            None => None,
        }
    }

    fn set(&self, name: &str, value: &str, ttl_secs: u64) {
        let ttl_ms = (ttl_secs as i64).saturating_mul(1000);
        let cookie = StoredCookie {
            value: value.to_string(),
            expires_at_ms: self.clock.now_millis().saturating_add(ttl_ms),
        };
        lock(&self.entries).insert(name.to_string(), cookie);
    }

    fn remove(&self, name: &str) {
        lock(&self.entries).remove(name);
    }
}

/// Request-scoped jar built from an incoming `Cookie` header.
///
/// Writes are visible to later reads on the same jar and are collected as
/// `Set-Cookie` values for the response.
pub struct HeaderCookieJar {
    clock: Arc<dyn Clock>,
    secure: bool,
    current: Mutex<HashMap<String, String>>,
    pending: Mutex<Vec<String>>,
}

impl HeaderCookieJar {
    pub fn from_headers(headers: &HeaderMap, clock: Arc<dyn Clock>, secure: bool) -> Self {
        Self::from_cookie(headers.typed_get::<Cookie>().as_ref(), clock, secure)
    }

    /// Build from an already decoded `Cookie` header, if the request had one
    pub fn from_cookie(cookie: Option<&Cookie>, clock: Arc<dyn Clock>, secure: bool) -> Self {
        let current = match cookie {
            Some(cookie) => cookie
                .iter()
                .map(|(name, value)| {
                    let value = urlencoding::decode(value)
                        .map(|decoded| decoded.into_owned())
                        .unwrap_or_else(|_| value.to_string());
                    (name.to_string(), value)
                })
                .collect(),
            None => {
                tracing::debug!("No cookie header found");
                HashMap::new()
            }
        };

        Self {
            clock,
            secure,
            current: Mutex::new(current),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// `Set-Cookie` headers for every write made through this jar, in order
    pub fn set_cookie_headers(&self) -> Result<HeaderMap, SessionError> {
        let mut headers = HeaderMap::new();
        for cookie in lock(&self.pending).iter() {
            header_set_cookie(&mut headers, cookie)?;
        }
        Ok(headers)
    }

    fn push_set_cookie(&self, name: &str, value: &str, max_age: i64) {
        let expires_at = self.clock.now() + Duration::seconds(max_age);
        let cookie = render_set_cookie(name, value, expires_at, max_age, self.secure);
        tracing::trace!("Set-Cookie: {}", cookie);
        lock(&self.pending).push(cookie);
    }
}

impl CookieJar for HeaderCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        lock(&self.current).get(name).cloned()
    }

    fn set(&self, name: &str, value: &str, ttl_secs: u64) {
        lock(&self.current).insert(name.to_string(), value.to_string());
        self.push_set_cookie(name, value, ttl_secs as i64);
    }

    fn remove(&self, name: &str) {
        lock(&self.current).remove(name);
        self.push_set_cookie(name, "", -86400);
    }
}

/// Jar for contexts without a cookie store. Reads nothing, writes nowhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCookies;

impl CookieJar for NoCookies {
    fn get(&self, _name: &str) -> Option<String> {
        None
    }

    fn set(&self, _name: &str, _value: &str, _ttl_secs: u64) {}

    fn remove(&self, _name: &str) {}
}
