//! [`AppError`] and the JSON envelope every endpoint answers with

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Display;
use thiserror::Error;

/// Request-level error: a code, a message for humans and optional context
///
/// `details` keeps insertion order so error bodies are stable across runs.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<Map<String, Value>>,
}

impl AppError {
    /// Error with the default message of its code
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attach one context entry
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ==================== Persistence ====================

    /// `"{resource} not found"` under a resource-specific code
    pub fn missing(code: ErrorCode, resource: impl Display) -> Self {
        let resource = resource.to_string();
        Self::with_message(code, format!("{resource} not found")).with_detail("resource", resource)
    }

    /// Missing mandatory input, naming the field
    pub fn required_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::with_message(ErrorCode::RequiredField, format!("{field} is required"))
            .with_detail("field", field)
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    pub fn insert_failed(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InsertFailed, msg)
    }

    pub fn update_failed(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::UpdateFailed, msg)
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    // ==================== Orders ====================

    /// Items added through a client that does not own the order
    pub fn client_mismatch(order_id: i64, client_id: i64) -> Self {
        Self::new(ErrorCode::OrderClientMismatch)
            .with_detail("order_id", order_id)
            .with_detail("client_id", client_id)
    }

    /// Order placed on a table owned by another client
    pub fn table_mismatch(table_id: i64, client_id: i64) -> Self {
        Self::new(ErrorCode::TableClientMismatch)
            .with_detail("table_id", table_id)
            .with_detail("client_id", client_id)
    }

    // ==================== Realtime ====================

    /// Too many notifications waiting for a queue slot
    pub fn overloaded(max_pending: usize) -> Self {
        Self::new(ErrorCode::EventQueueOverloaded).with_detail("max_pending", max_pending)
    }

    /// Notification that could not be turned into JSON
    pub fn serialization(err: impl Display) -> Self {
        Self::with_message(ErrorCode::SerializationFailed, err.to_string())
    }
}

/// Response envelope
///
/// `code` is 0 on success. Failures carry the error code, its message and
/// optional details; `data` is only present on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: ErrorCode::Success.code(),
            message: "OK".to_string(),
            data: Some(data),
            details: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == ErrorCode::Success.code()
    }
}

impl ApiResponse<()> {
    /// Success without payload
    pub fn ok() -> Self {
        Self {
            code: ErrorCode::Success.code(),
            message: "OK".to_string(),
            data: None,
            details: None,
        }
    }
}

impl<T> From<AppError> for ApiResponse<T> {
    fn from(err: AppError) -> Self {
        Self {
            code: err.code.code(),
            message: err.message,
            data: None,
            details: err.details,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self.code.category() {
            ErrorCategory::System => {
                tracing::error!(code = %self.code, message = %self.message, "System error occurred");
            }
            ErrorCategory::Realtime => {
                tracing::warn!(code = %self.code, message = %self.message, "Realtime error");
            }
            _ => {
                tracing::debug!(code = %self.code, message = %self.message, "Request rejected");
            }
        }

        let status = self.http_status();
        (status, axum::Json(ApiResponse::<()>::from(self))).into_response()
    }
}
