/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>` which automatically converts
/// to the appropriate status code and `{"message", "error"}` envelope.
///
/// # Status mapping
///
/// | Variant | Status | `error` field |
/// |---|---|---|
/// | `BadRequest` | 400 | `"bad_request"` |
/// | `Validation` | 400 | per-field message lists |
/// | `NotTeamMember` | 400 | `"bad_request"` + current member list |
/// | `Unauthorized` | 401 | `"unauthorized"` |
/// | `Forbidden` | 403 | `"forbidden"` |
/// | `NotFound` | 404 | `"not_found"` |
/// | `Internal` | 500 | `"internal_error"` |
///
/// Uniqueness and referential-integrity violations stem from client input,
/// so they map to 400, never 409 or 500.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

use taskdesk_shared::auth::token::TokenError;
use taskdesk_shared::error::DomainError;
use taskdesk_shared::policy::PolicyError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Per-field validation messages; BTreeMap keeps response key order stable
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Key for validation errors not tied to a single field
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Validation failure (400) with per-field error messages
    Validation(FieldErrors),

    /// Membership removal named an account that isn't on the team (400);
    /// carries the current member list for client reconciliation
    NotTeamMember { team_members: Vec<String> },

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Internal server error (500)
    Internal(String),
}

impl ApiError {
    /// A validation error on one field
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![message.into()]);
        ApiError::Validation(errors)
    }

    /// A validation error under the `non_field_errors` key
    pub fn non_field(message: impl Into<String>) -> Self {
        Self::field(NON_FIELD_ERRORS, message)
    }

    /// The standard 404 body
    pub fn not_found() -> Self {
        ApiError::NotFound("Not found.".to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Validation(errors) => {
                write!(f, "Validation error: {} field(s)", errors.len())
            }
            ApiError::NotTeamMember { .. } => write!(f, "User is not a team member"),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "message": message, "error": "bad_request" }),
            ),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "message": "Validation error", "error": errors }),
            ),
            ApiError::NotTeamMember { team_members } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "message": "User is not a team member",
                    "error": "bad_request",
                    "team_members": team_members,
                }),
            ),
            ApiError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                json!({ "message": message, "error": "unauthorized" }),
            ),
            ApiError::Forbidden(message) => (
                StatusCode::FORBIDDEN,
                json!({ "message": message, "error": "forbidden" }),
            ),
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                json!({ "message": message, "error": "not_found" }),
            ),
            ApiError::Internal(message) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "An internal error occurred", "error": "internal_error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Convert policy decisions to API errors (the 401/403 split)
impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Unauthorized => ApiError::Unauthorized(err.to_string()),
            PolicyError::Forbidden { .. } => ApiError::Forbidden(err.to_string()),
        }
    }
}

/// Convert domain errors to API errors
impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::UniquenessViolation { field, message } => ApiError::field(field, message),
            // Team-member references speak account ids and answer in the
            // bad_request shape; other dangling references are field errors.
            DomainError::ReferenceNotFound { field, message } if field == "team_members" => {
                ApiError::BadRequest(message)
            }
            DomainError::ReferenceNotFound { field, message } => ApiError::field(field, message),
            // The remove handler intercepts this variant to attach the
            // current member list; this is the fallback mapping.
            DomainError::NotTeamMember { .. } => ApiError::NotTeamMember {
                team_members: Vec::new(),
            },
            DomainError::Password(e) => ApiError::Internal(e.to_string()),
            DomainError::Database(e) => e.into(),
        }
    }
}

/// Convert token errors to API errors
impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

/// Convert sqlx errors to API errors
///
/// Constraint violations stem from client input and surface as 400;
/// everything else is an infrastructure fault and stays a 500.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::not_found(),
            sqlx::Error::Database(db_err) => match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation => {
                    if db_err
                        .constraint()
                        .map(|c| c.contains("email"))
                        .unwrap_or(false)
                    {
                        ApiError::field("email", "user account with this email already exists")
                    } else {
                        ApiError::BadRequest(format!(
                            "Duplicate value violates constraint {}",
                            db_err.constraint().unwrap_or("unknown")
                        ))
                    }
                }
                sqlx::error::ErrorKind::ForeignKeyViolation => ApiError::BadRequest(
                    "Operation not permitted: other records still reference this one".to_string(),
                ),
                sqlx::error::ErrorKind::NotNullViolation
                | sqlx::error::ErrorKind::CheckViolation => {
                    ApiError::BadRequest(db_err.to_string())
                }
                _ => ApiError::Internal(format!("Database error: {}", db_err)),
            },
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Flattens `validator` derive output into the per-field error map
pub fn validation_errors(errors: validator::ValidationErrors) -> ApiError {
    let mut fields = FieldErrors::new();
    for (field, messages) in errors.field_errors() {
        let entry = fields.entry(field.to_string()).or_default();
        for error in messages {
            entry.push(
                error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            );
        }
    }
    ApiError::Validation(fields)
}
