use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::response::{ApiResponse, FieldError};

const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";
const INVALID_TEXT_REPRESENTATION: &str = "22P02";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::Validation {
            message: "Validation Error".into(),
            errors,
        }
    }

    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::validation(vec![FieldError::new(field, message)])
    }

    pub fn not_found() -> Self {
        Self::NotFound("Resource not found".into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Validation { message, errors } => {
                ApiResponse::<()>::error(status, message, Some(errors))
            }
            Self::Internal(e) => {
                error!(error = ?e, "unhandled internal error");
                ApiResponse::<()>::error(status, "Internal Server Error", None)
            }
            other => ApiResponse::<()>::error(status, other.to_string(), None),
        };
        body.into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => return Self::not_found(),
            sqlx::Error::Database(db_err) => {
                let field = db_err
                    .constraint()
                    .map(field_from_constraint)
                    .unwrap_or_else(|| "value".to_string());
                match db_err.code().as_deref() {
                    Some(UNIQUE_VIOLATION) => {
                        warn!(%field, "unique constraint violated");
                        return Self::Conflict(format!("{field} already exists"));
                    }
                    Some(CHECK_VIOLATION) => {
                        return Self::field(field.clone(), format!("{field} is out of range"));
                    }
                    Some(INVALID_TEXT_REPRESENTATION) => return Self::not_found(),
                    _ => {}
                }
            }
            _ => {}
        }
        Self::Internal(anyhow::Error::new(err).context("database error"))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::field("body", rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::field("query", rejection.body_text())
    }
}

/// `users_email_key` -> `email`
fn field_from_constraint(constraint: &str) -> String {
    let without_table = constraint
        .split_once('_')
        .map(|(_, rest)| rest)
        .unwrap_or(constraint);
    without_table
        .trim_end_matches("_key")
        .trim_end_matches("_check")
        .trim_end_matches("_idx")
        .to_string()
}

/// A path id that is not a UUID cannot name a stored record.
pub fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn constraint_names_map_to_fields() {
        assert_eq!(field_from_constraint("users_email_key"), "email");
        assert_eq!(field_from_constraint("users_age_check"), "age");
        assert_eq!(field_from_constraint("weird"), "weird");
    }

    #[test]
    fn bad_ids_are_not_found() {
        assert!(matches!(parse_id("not-a-uuid"), Err(AppError::NotFound(_))));
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn row_not_found_is_404() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn conflict_renders_envelope() {
        let (status, body) = body_json(AppError::Conflict("email already exists".into())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(body["status"], 409);
        assert_eq!(body["message"], "email already exists");
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let (status, body) = body_json(AppError::Internal(anyhow::anyhow!("pool exploded"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal Server Error");
    }

    #[tokio::test]
    async fn validation_lists_fields() {
        let (status, body) = body_json(AppError::validation(vec![
            FieldError::new("name", "Name is required"),
            FieldError::new("email", "Email is required"),
        ]))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
    }
}
