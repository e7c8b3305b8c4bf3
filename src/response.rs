use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// One failing field in a validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Uniform JSON envelope shared by every response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: Option<T>, message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
            status: status.as_u16(),
            errors: None,
        }
    }

    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::success(Some(data), message, StatusCode::OK)
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::success(Some(data), message, StatusCode::CREATED)
    }
}

impl ApiResponse<()> {
    pub fn empty(message: impl Into<String>) -> Self {
        Self::success(None, message, StatusCode::OK)
    }

    pub fn error(
        status: StatusCode,
        message: impl Into<String>,
        errors: Option<Vec<FieldError>>,
    ) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
            status: status.as_u16(),
            errors,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}
