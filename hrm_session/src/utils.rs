use chrono::{DateTime, Utc};
use http::header::{HeaderMap, HeaderValue, SET_COOKIE};

use crate::errors::SessionError;

/// Render a `Set-Cookie` value for one of the guard cookies.
///
/// The cookies stay readable from page script, so `HttpOnly` is never set.
pub(crate) fn render_set_cookie(
    name: &str,
    value: &str,
    expires_at: DateTime<Utc>,
    max_age: i64,
    secure: bool,
) -> String {
    let value = urlencoding::encode(value);
    let expires = expires_at.format("%a, %d %b %Y %H:%M:%S GMT");
    let mut cookie =
        format!("{name}={value}; SameSite=Lax; Path=/; Max-Age={max_age}; Expires={expires}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub(crate) fn header_set_cookie(
    headers: &mut HeaderMap,
    cookie: &str,
) -> Result<(), SessionError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|_| SessionError::Cookie("Failed to parse cookie".to_string()))?;
    headers.append(SET_COOKIE, value);
    Ok(())
}
