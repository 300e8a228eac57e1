//! # Error Handling for Search APIs
//!
//! Two layers live here:
//!
//! - [`SearchError`] is what the engine returns. Every variant except
//!   [`SearchError::UnknownEntity`] describes bad client input and carries the
//!   offending field and value so a user-facing message can be built.
//! - [`ApiError`] is what handlers return. It maps search errors to `400`,
//!   missing records to `404`, and database or wiring failures to `500`, and
//!   renders the body clients already rely on:
//!
//! ```json
//! {"success": false, "error_reason": "Date search error: ..."}
//! ```
//!
//! ## Logging
//!
//! Internal errors are logged using the `tracing` crate when converted into a
//! response. Their details never reach the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors raised while turning client parameters into a query.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A boolean field received a token outside the true/false sets.
    #[error("{field} has invalid boolean field value of {value}")]
    InvalidBooleanValue { field: String, value: String },

    /// Malformed timestamp, unknown or non-date attribute, or start >= end.
    #[error("{0}")]
    DateSearch(String),

    /// Malformed expression tree, wrong operator cardinality, or any error
    /// raised while compiling an operator search.
    #[error("{message}")]
    SearchWithOperator {
        message: String,
        #[source]
        source: Option<Box<SearchError>>,
    },

    /// A field path does not resolve on the entity or its relations.
    #[error("Cannot resolve keyword '{path}' into field on {entity}")]
    UnknownField { entity: String, path: String },

    /// A declared rename points at a path that does not exist.
    #[error("Rename of '{key}' on {entity} points at unknown field path '{target}'")]
    UnresolvedRename {
        entity: String,
        key: String,
        target: String,
    },

    /// A parameter value has a shape the compiler cannot search with.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidParameter { field: String, reason: String },

    /// `order_by` names something that cannot be ordered on.
    #[error("Cannot order by '{0}'")]
    InvalidOrdering(String),

    #[error("Invalid value, per_page/page are integers only.")]
    PageNotAnInteger,

    /// The entity was never registered with the schema registry.
    #[error("Entity '{0}' is not registered for search")]
    UnknownEntity(String),
}

impl SearchError {
    pub fn date(message: impl Into<String>) -> Self {
        Self::DateSearch(message.into())
    }

    pub fn operator(message: impl Into<String>) -> Self {
        Self::SearchWithOperator {
            message: message.into(),
            source: None,
        }
    }

    pub fn unknown_field(entity: impl Into<String>, path: impl Into<String>) -> Self {
        Self::UnknownField {
            entity: entity.into(),
            path: path.into(),
        }
    }

    pub fn invalid_parameter(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an error raised while compiling an operator search, keeping the
    /// original as the source. Operator errors pass through unchanged.
    #[must_use]
    pub fn into_operator_error(self) -> Self {
        match self {
            Self::SearchWithOperator { .. } => self,
            other => Self::SearchWithOperator {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }

    /// True when the error was caused by client input rather than wiring.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::UnknownEntity(_))
    }

    /// Prefix used in the user-facing `error_reason`.
    fn reason_prefix(&self) -> &'static str {
        match self {
            Self::DateSearch(_) => "Date search error",
            Self::SearchWithOperator { .. } => "Search error",
            _ => "Invalid parameters or data",
        }
    }
}

/// API error type with automatic logging and sanitized responses
#[derive(Debug)]
pub enum ApiError {
    /// 404 Not Found - Resource doesn't exist
    NotFound {
        /// Resource type (e.g., "Question")
        resource: String,
        /// Optional ID that wasn't found
        id: Option<String>,
    },

    /// 400 Bad Request - Invalid input from user
    BadRequest {
        /// User-facing error message
        message: String,
    },

    /// 400 for client input errors, 500 for registry wiring errors
    Search(SearchError),

    /// 500 Internal Server Error - Database error (details logged, not exposed)
    Database {
        /// User-facing generic message
        message: String,
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },

    /// 500 Internal Server Error - Generic internal error
    Internal {
        /// User-facing generic message
        message: String,
        /// Internal error details (logged, not sent to user)
        internal: Option<String>,
    },
}

impl ApiError {
    pub fn not_found(resource: impl Into<String>, id: Option<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a 500 Internal Server Error from a database error
    ///
    /// The database error details are logged but NOT sent to the user.
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "Server Error, contact Roon to resolve".to_string(),
            internal: err,
        }
    }

    pub fn internal(message: impl Into<String>, internal: Option<String>) -> Self {
        Self::Internal {
            message: message.into(),
            internal,
        }
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Search(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Search(_) | Self::Database { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the user-facing error message (sanitized)
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { resource, id } => match id {
                Some(id) => format!("Resource not found: {resource} with ID '{id}' not found"),
                None => format!("Resource not found: {resource} not found"),
            },
            Self::BadRequest { message } => format!("Bad Request: {message}"),
            Self::Search(err) if err.is_client_error() => {
                format!("{}: {err}", err.reason_prefix())
            }
            Self::Search(_) => "Server Error, contact Roon to resolve".to_string(),
            Self::Database { message, .. } | Self::Internal { message, .. } => message.clone(),
        }
    }

    /// Log internal error details (not sent to user)
    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::Internal {
                internal: Some(details),
                ..
            } => {
                tracing::error!(details = %details, "Internal error occurred");
            }
            Self::Search(err) if !err.is_client_error() => {
                tracing::error!(error = %err, "Search engine misconfigured");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "API error"
                );
            }
        }
    }
}

/// Error response sent to users (sanitized)
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error_reason: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let response = ErrorResponse {
            success: false,
            error_reason: self.user_message(),
        };

        (status, Json(response)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for ApiError {}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        Self::Search(err)
    }
}

/// `DbErr::RecordNotFound` becomes a 404, everything else a logged 500.
impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(msg) => Self::not_found(msg, None),
            other => Self::database(other),
        }
    }
}
