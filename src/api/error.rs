//! HTTP mapping for domain errors

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::domain::DomainError;

impl DomainError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Validation { .. }
            | DomainError::Conflict(_)
            | DomainError::NotPresent(_)
            | DomainError::SelfReference(_) => StatusCode::BAD_REQUEST,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden => StatusCode::FORBIDDEN,
            DomainError::Database(_) | DomainError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> Value {
        match self {
            // Field-keyed, one list of messages per field
            DomainError::Validation { field, message } => {
                let mut body = serde_json::Map::new();
                body.insert(field.clone(), json!([message]));
                Value::Object(body)
            }
            DomainError::Conflict(msg)
            | DomainError::NotPresent(msg)
            | DomainError::SelfReference(msg) => json!({ "errors": msg }),
            DomainError::Database(_) | DomainError::Internal(_) => {
                json!({ "detail": "Internal server error" })
            }
            other => json!({ "detail": other.to_string() }),
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self);
        }
        (status, Json(self.body())).into_response()
    }
}
