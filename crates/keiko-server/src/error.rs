use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use keiko_core::error::KeikoError;

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Wrap a failed `spawn_blocking` join.
    pub fn join(err: tokio::task::JoinError) -> Self {
        Self(anyhow::anyhow!("task join error: {err}"))
    }
}

fn status_for(err: &KeikoError) -> StatusCode {
    match err {
        KeikoError::UnknownChallenge(_) | KeikoError::UnknownVirtue(_) => StatusCode::NOT_FOUND,
        KeikoError::InvalidId(_) | KeikoError::InvalidScope(_) | KeikoError::NotInitialized => {
            StatusCode::BAD_REQUEST
        }
        KeikoError::LogUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        KeikoError::InvalidCatalog(_)
        | KeikoError::Io(_)
        | KeikoError::Yaml(_)
        | KeikoError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, retryable) = match self.0.downcast_ref::<KeikoError>() {
            Some(e) => (status_for(e), e.is_retryable()),
            None => (StatusCode::INTERNAL_SERVER_ERROR, false),
        };

        if status.is_server_error() {
            tracing::warn!(%status, "request failed: {:#}", self.0);
        }

        let body = serde_json::json!({ "error": self.0.to_string(), "retryable": retryable });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    fn status(err: KeikoError) -> StatusCode {
        AppError(err.into()).into_response().status()
    }

    #[test]
    fn unknown_challenge_maps_to_404() {
        assert_eq!(
            status(KeikoError::UnknownChallenge("juggling".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn unknown_virtue_maps_to_404() {
        assert_eq!(
            status(KeikoError::UnknownVirtue("patience".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn invalid_id_maps_to_400() {
        assert_eq!(
            status(KeikoError::InvalidId("a/b".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn invalid_scope_maps_to_400() {
        assert_eq!(
            status(KeikoError::InvalidScope("monthly".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn not_initialized_maps_to_400() {
        assert_eq!(status(KeikoError::NotInitialized), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn log_unavailable_maps_to_503() {
        assert_eq!(
            status(KeikoError::LogUnavailable("disk gone".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn io_error_maps_to_500() {
        let io_err = std::io::Error::other("disk full");
        assert_eq!(
            status(KeikoError::Io(io_err)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn non_keiko_error_maps_to_500() {
        let err = AppError(anyhow::anyhow!("something unexpected"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn response_body_is_json() {
        let err = AppError(KeikoError::UnknownChallenge("juggling".into()).into());
        let response = err.into_response();
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("should have content-type");
        assert!(ct.to_str().unwrap().contains("application/json"));
    }
}
