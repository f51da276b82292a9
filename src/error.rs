use std::collections::BTreeMap;

use poem::error::ResponseError;
use poem::http::{StatusCode, header};
use poem::web::Json;
use poem::{IntoResponse, Response};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::avatar::AvatarError;

/// Field name -> messages, in the shape the forms report them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_owned()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_result(self) -> Result<(), ForumError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ForumError::Validation(self))
        }
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Self::default();
        for (field, problems) in errors.field_errors() {
            for problem in problems {
                let message = problem
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid value ({})", problem.code));
                fields.add(&field, message);
            }
        }
        fields
    }
}

#[derive(Debug, Error)]
pub enum ForumError {
    #[error("validation failed")]
    Validation(FieldErrors),
    /// The caller has no session. `next` is where to send them after logging in.
    #[error("authentication required")]
    Unauthenticated { next: Option<String> },
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("forbidden")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error(transparent)]
    Avatar(#[from] AvatarError),
    #[error(transparent)]
    Database(DbErr),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ForumError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(FieldErrors::single(field, message))
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for ForumError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.into())
    }
}

impl From<DbErr> for ForumError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => Self::Constraint(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => Self::Constraint(msg),
            _ => Self::Database(err),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
}

impl ResponseError for ForumError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthenticated { .. } => StatusCode::SEE_OTHER,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Avatar(err) if err.is_client_error() => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Avatar(_) | Self::Constraint(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn as_response(&self) -> Response {
        let status = self.status();
        match self {
            Self::Unauthenticated { next } => {
                let location = match next {
                    Some(next) => format!("/login?next={}", urlencoding::encode(next)),
                    None => "/login".to_owned(),
                };
                Response::builder()
                    .status(status)
                    .header(header::LOCATION, location)
                    .finish()
            }
            Self::Avatar(err) if err.is_client_error() => {
                let errors = FieldErrors::single("avatar", err.to_string());
                let body = ErrorBody { error: "validation failed", errors: Some(&errors) };
                Json(body).with_status(status).into_response()
            }
            Self::Validation(errors) => {
                let body = ErrorBody { error: "validation failed", errors: Some(errors) };
                Json(body).with_status(status).into_response()
            }
            _ if status.is_server_error() => {
                // Storage details stay in the log.
                error!(error = %self, "request failed");
                let body = ErrorBody { error: "something went wrong", errors: None };
                Json(body).with_status(status).into_response()
            }
            _ => {
                let message = self.to_string();
                Json(ErrorBody { error: &message, errors: None })
                    .with_status(status)
                    .into_response()
            }
        }
    }
}
