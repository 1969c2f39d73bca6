use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::llm_client::{LlmError, ResponseShape};
use crate::review::analyzer::AnalysisError;
use crate::review::intake::IntakeError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// `details` is auxiliary operator context (payload snippets, envelope shape). The user-facing
/// string is always `message`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Empty model output")]
    EmptyOutput { details: Value },

    #[error("Decode failed: {message}")]
    Decode { message: String, details: Value },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<IntakeError> for AppError {
    fn from(err: IntakeError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Upload(e) | AnalysisError::Generation(e) => {
                AppError::Llm(upstream_message(&e))
            }
            AnalysisError::EmptyOutput { shape } => AppError::EmptyOutput {
                details: json!({ "response_shape": shape_json(&shape) }),
            },
            AnalysisError::Decode { error, shape } => {
                let d = error.diagnostics();
                AppError::Decode {
                    message: error.to_string(),
                    details: json!({
                        "raw_length": d.raw_length,
                        "raw_head": d.raw_head,
                        "raw_tail": d.raw_tail,
                        "response_shape": shape_json(&shape),
                    }),
                }
            }
        }
    }
}

fn upstream_message(err: &LlmError) -> String {
    match err {
        LlmError::Api { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

fn shape_json(shape: &ResponseShape) -> Value {
    serde_json::to_value(shape).unwrap_or(Value::Null)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None),
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIGURATION_ERROR",
                    msg,
                    None,
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, "LLM_ERROR", msg, None)
            }
            AppError::EmptyOutput { details } => {
                tracing::error!(%details, "Model returned no usable text");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EMPTY_OUTPUT",
                    "The model returned no usable text. Please try again.".to_string(),
                    Some(details),
                )
            }
            AppError::Decode { message, details } => {
                tracing::error!(%details, "Decode failed: {message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DECODE_FAILED",
                    "The model response could not be read as a report. Please try again."
                        .to_string(),
                    Some(details),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{DecodeError, Diagnostics};
    use crate::llm_client::ResponseEnvelope;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_maps_to_400_without_details() {
        let response = AppError::from(IntakeError::TooManyPages { pages: 3 }).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "Your CV has 3 pages. Maximum allowed: 2.");
        assert!(body["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn test_decode_failure_keeps_snippets_out_of_message() {
        let raw = "not json at all";
        let err = AnalysisError::Decode {
            error: DecodeError::Unrecoverable(Diagnostics::capture(raw)),
            shape: ResponseEnvelope::default().shape(),
        };
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "DECODE_FAILED");
        assert!(!body["error"]["message"].as_str().unwrap().contains(raw));
        assert_eq!(body["error"]["details"]["raw_head"], raw);
        assert_eq!(body["error"]["details"]["raw_length"], raw.len());
        assert_eq!(body["error"]["details"]["response_shape"]["output_count"], 0);
    }

    #[tokio::test]
    async fn test_upstream_api_message_is_surfaced() {
        let err = AnalysisError::Generation(LlmError::Api {
            status: 429,
            message: "Rate limit reached".to_string(),
        });
        let response = AppError::from(err).into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "LLM_ERROR");
        assert_eq!(body["error"]["message"], "Rate limit reached");
    }

    #[tokio::test]
    async fn test_empty_output_has_its_own_code() {
        let err = AnalysisError::EmptyOutput {
            shape: ResponseEnvelope::default().shape(),
        };
        let body = body_json(AppError::from(err).into_response()).await;
        assert_eq!(body["error"]["code"], "EMPTY_OUTPUT");
        assert!(body["error"]["details"]["response_shape"].is_object());
    }
}
