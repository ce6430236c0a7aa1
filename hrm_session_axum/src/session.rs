use std::sync::Arc;

use http::HeaderMap;

use hrm_session::{Clock, SessionError, SystemClock, begin_session, end_session};

use super::config::{GUARD_CONFIG, HRM_COOKIE_SECURE};
use super::guard::{request_jar, request_store};

/// `Set-Cookie` headers recording a successful login
///
/// # Arguments
/// * `token` - Access token handed out by the backend, kept as the token placeholder cookie
///
/// # Returns
/// * `Result<HeaderMap, SessionError>` - The headers to attach to the login response
pub fn prepare_login_headers(token: Option<&str>) -> Result<HeaderMap, SessionError> {
    login_headers_at(token, Arc::new(SystemClock), *HRM_COOKIE_SECURE)
}

/// `Set-Cookie` headers removing every guard cookie
pub fn prepare_logout_headers() -> Result<HeaderMap, SessionError> {
    logout_headers_at(Arc::new(SystemClock), *HRM_COOKIE_SECURE)
}

fn login_headers_at(
    token: Option<&str>,
    clock: Arc<dyn Clock>,
    secure: bool,
) -> Result<HeaderMap, SessionError> {
    let jar = request_jar(None, &clock, secure);
    let store = request_store(&jar, &GUARD_CONFIG);
    begin_session(store.as_ref(), clock.as_ref(), &GUARD_CONFIG, token);
    jar.set_cookie_headers()
}

fn logout_headers_at(clock: Arc<dyn Clock>, secure: bool) -> Result<HeaderMap, SessionError> {
    let jar = request_jar(None, &clock, secure);
    let store = request_store(&jar, &GUARD_CONFIG);
    end_session(store.as_ref());
    jar.set_cookie_headers()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrm_session::ManualClock;
    use http::header::SET_COOKIE;

    fn values(headers: &HeaderMap) -> Vec<String> {
        headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_login_headers() {
        let headers =
            login_headers_at(Some("api token"), Arc::new(ManualClock::new(42_000)), true).unwrap();

        let cookies = values(&headers);
        assert!(cookies.iter().any(|c| c.starts_with("token=api%20token;")));
        assert!(cookies.iter().any(|c| c.starts_with("isLoggedIn=true;")));
        assert!(cookies.iter().any(|c| c.starts_with("lastActivity=42000;")));
        assert!(cookies.iter().all(|c| c.ends_with("; Secure")));
        assert!(cookies.iter().all(|c| !c.contains("HttpOnly")));
    }

    #[test]
    fn test_login_headers_without_token() {
        let headers = login_headers_at(None, Arc::new(ManualClock::new(0)), false).unwrap();

        let cookies = values(&headers);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| !c.starts_with("token=")));
    }

    #[test]
    fn test_logout_headers_expire_every_cookie() {
        let headers = logout_headers_at(Arc::new(ManualClock::new(0)), false).unwrap();

        let cookies = values(&headers);
        assert_eq!(cookies.len(), 3);
        for name in ["isLoggedIn=", "lastActivity=", "token="] {
            assert!(cookies.iter().any(|c| c.starts_with(name)));
        }
        assert!(cookies.iter().all(|c| c.contains("Max-Age=-86400")));
    }
}
