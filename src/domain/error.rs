use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("user not found: {0}")]
    UserNotFound(Uuid),
    #[error("username already taken")]
    UsernameTaken(String),
    #[error("post not found: {0}")]
    PostNotFound(i64),
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::UserNotFound(_) | DomainError::PostNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::InvalidCredentials | DomainError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            DomainError::Forbidden => StatusCode::FORBIDDEN,
            DomainError::UsernameTaken(_) => StatusCode::CONFLICT,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        let details = match self {
            DomainError::PostNotFound(id) => Some(json!({ "resource": id })),
            DomainError::UserNotFound(id) => Some(json!({ "resource": id })),
            DomainError::UsernameTaken(username) => Some(json!({ "username": username })),
            DomainError::Forbidden => {
                Some(json!({ "message": "you can only modify your own posts" }))
            }
            DomainError::Validation(errors) => {
                let mut fields = serde_json::Map::new();
                for err in errors {
                    match fields.get_mut(err.field) {
                        Some(serde_json::Value::Array(messages)) => {
                            messages.push(json!(err.message));
                        }
                        _ => {
                            fields.insert(err.field.to_string(), json!([err.message]));
                        }
                    }
                }
                Some(serde_json::Value::Object(fields))
            }
            _ => None,
        };
        let body = ErrorBody {
            error: message.as_str(),
            details,
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            DomainError::PostNotFound(7).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(DomainError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            DomainError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            DomainError::Validation(vec![]).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DomainError::UsernameTaken("bob".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn validation_errors_group_by_field() {
        let err = DomainError::Validation(vec![
            FieldError::new("title", "title is required"),
            FieldError::new("title", "title must be at most 50 characters"),
            FieldError::new("content", "content is required"),
        ]);
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
