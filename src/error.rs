use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::users::store::StoreError;

/// Every failure a handler can surface, one variant per classification
/// branch. Rendering happens exactly once, in [`IntoResponse`], so the
/// handler `Result` is the whole normalization stage.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Application-level error carrying its own status, offending field and
    /// machine-readable code.
    #[error("{message}")]
    App {
        status: StatusCode,
        message: String,
        field: Option<String>,
        code: String,
        errors: Vec<String>,
    },

    /// Schema-level failure aggregating every per-field message.
    #[error("VALIDATION ERROR")]
    Validation { errors: Vec<String> },

    /// Unique-index violation reported by the store.
    #[error("{field} is already in use")]
    Duplicate { field: String, value: String },

    /// Anything nobody classified.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl ApiError {
    pub fn app(
        status: StatusCode,
        message: impl Into<String>,
        field: Option<&str>,
        code: &str,
    ) -> Self {
        ApiError::App {
            status,
            message: message.into(),
            field: field.map(str::to_string),
            code: code.to_string(),
            errors: Vec::new(),
        }
    }

    pub fn bad_request(message: impl Into<String>, field: Option<&str>, code: &str) -> Self {
        Self::app(StatusCode::BAD_REQUEST, message, field, code)
    }

    pub fn not_found(message: impl Into<String>, field: Option<&str>, code: &str) -> Self {
        Self::app(StatusCode::NOT_FOUND, message, field, code)
    }

    pub fn internal(message: impl Into<String>, field: Option<&str>, code: &str) -> Self {
        Self::app(StatusCode::INTERNAL_SERVER_ERROR, message, field, code)
    }

    /// Classify a store failure: duplicates keep their own envelope, backend
    /// failures collapse into the calling endpoint's 500.
    pub fn store(err: StoreError, message: &str, field: Option<&str>, code: &str) -> Self {
        match err {
            StoreError::Duplicate { field: dup_field, value } => ApiError::Duplicate {
                field: dup_field,
                value,
            },
            StoreError::Backend(source) => {
                error!(error = %source, code, "store operation failed");
                Self::internal(message, field, code)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::App {
                status,
                message,
                field,
                code,
                errors,
            } => {
                warn!(%status, code = %code, "request failed: {message}");
                (
                    status,
                    Json(json!({
                        "success": false,
                        "status": "Error",
                        "message": message,
                        "field": field,
                        "code": code,
                        "errors": errors,
                    })),
                )
                    .into_response()
            }
            ApiError::Validation { errors } => {
                warn!(?errors, "schema validation rejected the request");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "status": "error",
                        "message": "VALIDATION ERROR",
                        "errors": errors,
                    })),
                )
                    .into_response()
            }
            ApiError::Duplicate { field, value } => {
                warn!(field = %field, value = %value, "duplicate value rejected by unique index");
                let upper = field.to_uppercase();
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "status": "error",
                        "message": format!("{upper} IS ALREADY IN USE!"),
                        "field": field,
                        "value": value,
                        "code": format!("ERR_{upper}_IN_USE"),
                    })),
                )
                    .into_response()
            }
            ApiError::Unexpected(err) => {
                error!(error = %err, "unclassified error reached the boundary");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "status": "Unknown error",
                        "message": "INTERNAL SERVER ERROR!",
                        "error": err.to_string(),
                    })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn app_error_envelope() {
        let (status, body) = render(ApiError::bad_request(
            "ADD FUNCTION: INVALID AGE!",
            Some("age"),
            "ERR_INVALID_AGE",
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["status"], "Error");
        assert_eq!(body["message"], "ADD FUNCTION: INVALID AGE!");
        assert_eq!(body["field"], "age");
        assert_eq!(body["code"], "ERR_INVALID_AGE");
        assert_eq!(body["errors"], Value::Array(vec![]));
    }

    #[tokio::test]
    async fn app_error_allows_null_field() {
        let (status, body) = render(ApiError::internal(
            "UNEXPECTED ERROR IN REGISTER FUNCTION!",
            None,
            "ERR_REGISTER_FAILED",
        ))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["field"], Value::Null);
        assert_eq!(body["code"], "ERR_REGISTER_FAILED");
    }

    #[tokio::test]
    async fn validation_envelope_aggregates_messages() {
        let (status, body) = render(ApiError::Validation {
            errors: vec![
                "Name is required".to_string(),
                "Please, insert a valid email!".to_string(),
            ],
        })
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "VALIDATION ERROR");
        assert_eq!(body["errors"][0], "Name is required");
        assert_eq!(body["errors"][1], "Please, insert a valid email!");
    }

    #[tokio::test]
    async fn duplicate_envelope_names_field_and_value() {
        let (status, body) = render(ApiError::Duplicate {
            field: "email".to_string(),
            value: "duplicate@example.com".to_string(),
        })
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "EMAIL IS ALREADY IN USE!");
        assert_eq!(body["field"], "email");
        assert_eq!(body["value"], "duplicate@example.com");
        assert_eq!(body["code"], "ERR_EMAIL_IN_USE");
    }

    #[tokio::test]
    async fn unknown_envelope_keeps_original_message_for_diagnostics() {
        let (status, body) = render(ApiError::Unexpected(anyhow::anyhow!("boom"))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["status"], "Unknown error");
        assert_eq!(body["message"], "INTERNAL SERVER ERROR!");
        assert_eq!(body["error"], "boom");
    }

    #[tokio::test]
    async fn store_duplicate_passes_through() {
        let err = ApiError::store(
            StoreError::Duplicate {
                field: "email".to_string(),
                value: "x@y.com".to_string(),
            },
            "UNEXPECTED ERROR IN REGISTER FUNCTION!",
            None,
            "ERR_REGISTER_FAILED",
        );
        assert!(matches!(err, ApiError::Duplicate { .. }));

        let err = ApiError::store(
            StoreError::Backend(anyhow::anyhow!("connection reset")),
            "UNEXPECTED ERROR IN REGISTER FUNCTION!",
            None,
            "ERR_REGISTER_FAILED",
        );
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "UNEXPECTED ERROR IN REGISTER FUNCTION!");
    }
}
