use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::repository::RepositoryError;

/// ApiError
///
/// Every failure the API can surface, mapped one-to-one onto an HTTP status and
/// the stable machine-readable `error` code clients dispatch on. Handlers return
/// `Result<_, ApiError>` and bubble failures with `?`; conversion into the
/// `{message, error}` JSON body happens exactly once, in `IntoResponse`.
#[derive(Error, Debug)]
pub enum ApiError {
    // Bearer-gate failures.
    #[error("Access token required")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    // Token decoded fine but its subject no longer exists.
    #[error("User not found")]
    SubjectNotFound,
    #[error("Authentication error")]
    AuthFailure,

    // Credential / account failures.
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("User already exists with this email")]
    EmailExists,

    // Input failures.
    #[error("{0}")]
    Validation(String),
    #[error("Search query is required")]
    SearchQueryRequired,
    #[error("No valid fields provided for update")]
    NoUpdateFields,
    #[error("Invalid post ID")]
    InvalidPostId,
    #[error("Invalid user ID")]
    InvalidUserId,

    // Lookup failures.
    #[error("Post not found")]
    PostNotFound,
    #[error("User not found")]
    UserNotFound,

    // Ownership failures. The message differs per action ("edit"/"delete"),
    // the code does not.
    #[error("{0}")]
    UnauthorizedAccess(&'static str),
    #[error("You can only update your own profile")]
    UnauthorizedUpdate,

    // Infrastructure failures. The source is logged, never serialized.
    #[error("Internal server error")]
    Database(#[source] sqlx::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingToken
            | ApiError::InvalidToken
            | ApiError::TokenExpired
            | ApiError::SubjectNotFound
            | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::EmailExists
            | ApiError::Validation(_)
            | ApiError::SearchQueryRequired
            | ApiError::NoUpdateFields
            | ApiError::InvalidPostId
            | ApiError::InvalidUserId => StatusCode::BAD_REQUEST,
            ApiError::PostNotFound | ApiError::UserNotFound => StatusCode::NOT_FOUND,
            ApiError::UnauthorizedAccess(_) | ApiError::UnauthorizedUpdate => {
                StatusCode::FORBIDDEN
            }
            ApiError::AuthFailure | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The machine-readable code carried in the `error` field of the body.
    /// These are part of the wire contract and must stay stable.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingToken => "MISSING_TOKEN",
            ApiError::InvalidToken => "INVALID_TOKEN",
            ApiError::TokenExpired => "TOKEN_EXPIRED",
            ApiError::SubjectNotFound | ApiError::UserNotFound => "USER_NOT_FOUND",
            ApiError::AuthFailure => "AUTH_ERROR",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::EmailExists => "EMAIL_EXISTS",
            ApiError::Validation(_) => "VALIDATION_FAILED",
            ApiError::SearchQueryRequired => "SEARCH_QUERY_REQUIRED",
            ApiError::NoUpdateFields => "NO_UPDATE_FIELDS",
            ApiError::InvalidPostId => "INVALID_POST_ID",
            ApiError::InvalidUserId => "INVALID_USER_ID",
            ApiError::PostNotFound => "POST_NOT_FOUND",
            ApiError::UnauthorizedAccess(_) => "UNAUTHORIZED_ACCESS",
            ApiError::UnauthorizedUpdate => "UNAUTHORIZED_UPDATE",
            ApiError::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // The only unique key in the schema is users.email.
            RepositoryError::Duplicate(_) => ApiError::EmailExists,
            RepositoryError::Database(e) => ApiError::Database(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Database(source) = &self {
            tracing::error!(error = %source, "Repository failure surfaced to client");
        }
        let body = Json(json!({
            "message": self.to_string(),
            "error": self.code(),
        }));
        (self.status(), body).into_response()
    }
}
