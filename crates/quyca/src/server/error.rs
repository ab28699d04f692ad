//! HTTP error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::{ServiceError, StoreError};

/// A service error rendered as `{"error": code, "message": ...}`.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl ApiError {
    /// Status code and machine-readable code for the error.
    #[must_use]
    pub fn status(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            ServiceError::Validation { .. } => (StatusCode::BAD_REQUEST, "invalid_input"),
            ServiceError::Store(StoreError::InvalidId(_)) => (StatusCode::BAD_REQUEST, "invalid_id"),
            ServiceError::Store(StoreError::NotFound { .. }) => (StatusCode::NOT_FOUND, "not_found"),
            ServiceError::UnsupportedPlot { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unsupported_plot")
            }
            ServiceError::Store(_) => (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, code, "Request failed");
        } else {
            tracing::debug!(error = %self.0, code, "Request rejected");
        }
        let body = serde_json::json!({
            "error": code,
            "message": self.0.to_user_message(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let status = |err: ServiceError| ApiError(err).status().0;
        assert_eq!(status(ServiceError::validation("max", "too big")), StatusCode::BAD_REQUEST);
        assert_eq!(status(StoreError::InvalidId(String::new()).into()), StatusCode::BAD_REQUEST);
        assert_eq!(status(StoreError::not_found("person", "p1").into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status(ServiceError::unsupported_plot("year_h", "source")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status(ServiceError::internal("boom")), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
