//! Error types for the catalog service and their HTTP mapping.

use axum::{
    extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password.
    #[error("incorrect username or password")]
    Unauthorized,

    #[error("missing bearer token")]
    MissingToken,

    /// Bad signature, malformed token, expired token or unknown subject.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("password check did not complete: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("record encoding error: {0}")]
    Codec(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("product {0} not found")]
    ProductNotFound(u64),

    /// An extractor refused the request (bad path segment, query, form or JSON body).
    #[error("invalid {part}: {detail}")]
    InvalidInput {
        part: &'static str,
        status: StatusCode,
        detail: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{operation} failed: {source}")]
    Storage {
        operation: String,
        #[source]
        source: StorageError,
    },
}

/// JSON error body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: u16,
    pub timestamp: String,
}

impl AppError {
    /// Wraps a storage failure with the operation that hit it, for use with `map_err`.
    pub fn storage(operation: impl Into<String>) -> impl FnOnce(StorageError) -> AppError {
        let operation = operation.into();
        move |source| AppError::Storage { operation, source }
    }

    fn invalid_input(part: &'static str, status: StatusCode, detail: String) -> Self {
        AppError::InvalidInput { part, status, detail }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(AuthError::Signing(_))
            | AppError::Auth(AuthError::Hashing(_))
            | AppError::Auth(AuthError::Task(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::ProductNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput { status, .. } => *status,
            AppError::Storage { .. } | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Auth(AuthError::Unauthorized) => "UNAUTHORIZED",
            AppError::Auth(AuthError::MissingToken) | AppError::Auth(AuthError::InvalidToken(_)) => {
                "INVALID_TOKEN"
            }
            AppError::ProductNotFound(_) => "NOT_FOUND",
            AppError::InvalidInput { status, .. } if *status == StatusCode::UNPROCESSABLE_ENTITY => {
                "VALIDATION_ERROR"
            }
            AppError::InvalidInput { .. } => "BAD_REQUEST",
            _ => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Client-facing message. Server errors never carry their cause.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Auth(AuthError::Unauthorized) => "Incorrect username or password".to_string(),
            AppError::Auth(AuthError::MissingToken) | AppError::Auth(AuthError::InvalidToken(_)) => {
                "Could not validate credentials".to_string()
            }
            AppError::ProductNotFound(_) => "Product not found".to_string(),
            AppError::InvalidInput { part, .. } => format!("Invalid {part}"),
            _ => "Internal server error".to_string(),
        }
    }

    pub fn log(&self) {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = %self, error_code = code, status = status.as_u16(), "Server error occurred");
        } else if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(error = %self, error_code = code, "Authentication failed");
        } else {
            tracing::debug!(error = %self, error_code = code, "Client error occurred");
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::invalid_input("path parameter", rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::invalid_input("query string", rejection.status(), rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::invalid_input("request body", rejection.status(), rejection.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::invalid_input("form body", rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.status_code();
        let body = ErrorResponse {
            error: self.error_code().to_string(),
            message: self.user_message(),
            code: status.as_u16(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_map_to_401() {
        assert_eq!(AppError::from(AuthError::Unauthorized).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::from(AuthError::MissingToken).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::from(AuthError::InvalidToken("expired".into())).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn unauthorized_response_carries_challenge() {
        let response = AppError::from(AuthError::MissingToken).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[test]
    fn storage_failure_hides_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = AppError::storage("list products")(StorageError::Sled(sled::Error::Io(io)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().starts_with("list products failed"));
        assert_eq!(err.user_message(), "Internal server error");
    }

    #[test]
    fn missing_product_maps_to_404() {
        let err = AppError::ProductNotFound(42);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "product 42 not found");
    }

    #[test]
    fn config_failure_is_a_server_error() {
        let err = AppError::from(ConfigError::Invalid {
            key: "CATALOG_BCRYPT_COST",
            value: "2".to_string(),
            reason: "too low".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("CATALOG_BCRYPT_COST"));
        assert_eq!(err.user_message(), "Internal server error");
    }

    #[test]
    fn rejected_input_keeps_status_but_not_detail() {
        let err = AppError::invalid_input(
            "path parameter",
            StatusCode::BAD_REQUEST,
            "Cannot parse `abc` to a `u64`".to_string(),
        );
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "BAD_REQUEST");
        assert_eq!(err.user_message(), "Invalid path parameter");

        let response = err.into_response();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }
}
