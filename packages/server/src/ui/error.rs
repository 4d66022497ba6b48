//! HTTP error mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    domain::{AuthError, ValueObjectError},
    infrastructure::dto::http::ErrorResponse,
    usecase::UseCaseError,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::FailedPrecondition(_) => StatusCode::PRECONDITION_FAILED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::FailedPrecondition(_) => "failed_precondition",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::FailedPrecondition(msg)
            | ApiError::BadRequest(msg) => msg.clone(),
        };
        let body = ErrorResponse {
            error: self.code().to_string(),
            message,
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<UseCaseError> for ApiError {
    fn from(err: UseCaseError) -> Self {
        match err {
            UseCaseError::NotFound(msg) => ApiError::NotFound(msg),
            UseCaseError::Forbidden(msg) => ApiError::Forbidden(msg),
            UseCaseError::Conflict(msg) => ApiError::Conflict(msg),
            UseCaseError::FailedPrecondition(msg) => ApiError::FailedPrecondition(msg),
            UseCaseError::BadRequest(msg) => ApiError::BadRequest(msg),
            UseCaseError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<ValueObjectError> for ApiError {
    fn from(err: ValueObjectError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usecase_errors_map_to_status_codes() {
        // テスト項目: UseCase のエラー種別が対応する HTTP ステータスに変換される
        let cases = [
            (UseCaseError::NotFound(String::new()), StatusCode::NOT_FOUND),
            (UseCaseError::Forbidden(String::new()), StatusCode::FORBIDDEN),
            (UseCaseError::Conflict(String::new()), StatusCode::CONFLICT),
            (
                UseCaseError::FailedPrecondition(String::new()),
                StatusCode::PRECONDITION_FAILED,
            ),
            (UseCaseError::BadRequest(String::new()), StatusCode::BAD_REQUEST),
            (UseCaseError::Internal(String::new()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
        assert_eq!(
            ApiError::from(AuthError::Expired).status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
