use http::StatusCode;
use hrm_session::SessionError;

/// Helper trait for converting errors to a standard response error format
pub trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)>;
}

impl<T> IntoResponseError<T> for Result<T, SessionError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| {
            tracing::error!("Session error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_maps_to_500() {
        let result: Result<(), SessionError> =
            Err(SessionError::Cookie("Failed to parse cookie".to_string()));

        let response_error = result.into_response_error();

        assert_eq!(
            response_error,
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Cookie error: Failed to parse cookie".to_string()
            ))
        );
    }

    #[test]
    fn test_success_case() {
        let result: Result<String, SessionError> = Ok("Success".to_string());

        assert_eq!(result.into_response_error(), Ok("Success".to_string()));
    }
}
