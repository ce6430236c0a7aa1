//! Central configuration for the hrm_session_axum crate

use std::sync::{Arc, LazyLock};

use hrm_session::GuardConfig;

/// Whether guard cookies carry the `Secure` attribute
/// Default: true (set HRM_COOKIE_SECURE=false for plain-HTTP development)
pub static HRM_COOKIE_SECURE: LazyLock<bool> =
    LazyLock::new(|| parse_cookie_secure(std::env::var("HRM_COOKIE_SECURE").ok().as_deref()));

/// Mount point expected for `session_router()`
/// Default: "/session"
pub static HRM_SESSION_ROUTE_PREFIX: LazyLock<String> = LazyLock::new(|| {
    std::env::var("HRM_SESSION_ROUTE_PREFIX").unwrap_or_else(|_| "/session".to_string())
});

pub(crate) static GUARD_CONFIG: LazyLock<Arc<GuardConfig>> =
    LazyLock::new(|| Arc::new(GuardConfig::default()));

fn parse_cookie_secure(value: Option<&str>) -> bool {
    value
        .map(|val| val.to_lowercase() != "false")
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    fn test_cookie_secure_default() {
        assert!(parse_cookie_secure(None));
    }

    #[test]
    fn test_cookie_secure_false() {
        assert!(!parse_cookie_secure(Some("false")));
        assert!(!parse_cookie_secure(Some("FALSE")));
    }

    #[test]
    fn test_cookie_secure_other_value() {
        // Any value other than "false" (case-insensitive) keeps cookies secure
        assert!(parse_cookie_secure(Some("true")));
        assert!(parse_cookie_secure(Some("0")));
    }

    #[test]
    #[serial]
    fn test_cookie_secure_reads_environment() {
        let original = env::var("HRM_COOKIE_SECURE").ok();
        unsafe { env::set_var("HRM_COOKIE_SECURE", "false") };

        let parsed = parse_cookie_secure(env::var("HRM_COOKIE_SECURE").ok().as_deref());

        match original {
            Some(val) => unsafe { env::set_var("HRM_COOKIE_SECURE", val) },
            None => unsafe { env::remove_var("HRM_COOKIE_SECURE") },
        }
        assert!(!parsed);
    }

    #[test]
    fn test_guard_config_is_the_compiled_default() {
        assert_eq!(GUARD_CONFIG.inactivity_limit_secs, 60);
        assert!(GUARD_CONFIG.public_pages.contains("/hrm/login"));
    }
}
