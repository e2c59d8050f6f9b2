use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Scheduling conflict: interviewer {interviewer_id} already has an interview at {conflict_time}")]
    SchedulingConflict {
        interviewer_id: Uuid,
        conflict_time: DateTime<Utc>,
    },

    #[error("{0}")]
    Validation(String),

    #[error("Validation failed for one or more fields")]
    FieldValidation(#[from] validator::ValidationErrors),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    IllegalTransition(String),

    #[error("{0}")]
    BusinessRule(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{service} is currently unavailable: {message}")]
    ExternalService { service: String, message: String },

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// The error body shape shared by every error response. `path` is filled in
/// by the `error_context` middleware, which is the only place that sees the
/// request URI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonValue>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_value: Option<JsonValue>,
    pub message: String,
}

impl ErrorBody {
    pub fn new(status: StatusCode, message: String) -> Self {
        Self {
            timestamp: Utc::now(),
            status: status.as_u16(),
            error: status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
            message,
            path: String::new(),
            details: None,
            field_errors: None,
            metadata: None,
        }
    }
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) | Error::SchedulingConflict { .. } => StatusCode::CONFLICT,
            Error::Validation(_)
            | Error::FieldValidation(_)
            | Error::InvalidState(_)
            | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::IllegalTransition(_) | Error::BusinessRule(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::ExternalService { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::Multipart(e) => e.status(),
            Error::Config(_) | Error::Database(_) | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> ErrorBody {
        let mut body = ErrorBody::new(self.status(), self.to_string());

        match self {
            Error::SchedulingConflict {
                interviewer_id,
                conflict_time,
            } => {
                body.details = Some(
                    "The interviewer already has an interview scheduled at this time".to_string(),
                );
                body.metadata = Some(json!({
                    "interviewerId": interviewer_id,
                    "conflictTime": conflict_time,
                }));
            }
            Error::FieldValidation(errors) => {
                body.field_errors = Some(collect_field_errors(errors));
            }
            Error::ExternalService { service, message } => {
                body.details = Some(message.clone());
                body.metadata = Some(json!({ "serviceName": service }));
            }
            _ => {}
        }

        body
    }
}

fn collect_field_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    for (field, errs) in errors.field_errors() {
        for e in errs.iter() {
            out.push(FieldError {
                field: field.to_string(),
                rejected_value: e.params.get("value").cloned(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            });
        }
    }
    out
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        if self.status().is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = self.body();
        let mut response = (self.status(), Json(body.clone())).into_response();
        // Stashed for the error_context middleware, which rebuilds the body
        // with the request path filled in.
        response.extensions_mut().insert(body);
        response
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23505") => {
                Error::Conflict("Resource already exists".to_string())
            }
            other => Error::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_surface_contract() {
        assert_eq!(
            Error::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(Error::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            Error::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::InvalidState("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::IllegalTransition("x".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            Error::BusinessRule("x".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            Error::Forbidden("x".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            Error::ExternalService {
                service: "llm".into(),
                message: "down".into()
            }
            .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn scheduling_conflict_carries_interviewer_and_time() {
        let id = Uuid::new_v4();
        let at = Utc::now();
        let body = Error::SchedulingConflict {
            interviewer_id: id,
            conflict_time: at,
        }
        .body();

        let metadata = body.metadata.expect("metadata");
        assert_eq!(metadata["interviewerId"], json!(id));
        assert_eq!(body.status, 409);
    }
}
