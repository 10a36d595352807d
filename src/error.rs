//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request body could not be read as the expected JSON object,
    /// e.g., a required field is missing or the body is not valid JSON.
    ///
    /// The status code is the one chosen by the JSON extractor.
    #[error("{1}")]
    InvalidRequestBody(StatusCode, String),

    /// The request body was well formed but broke one of the rules for the
    /// data model, e.g., an empty category name.
    #[error("{0}")]
    Validation(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error occurs when a query by ID matches no rows or
    /// documents. Route handlers should replace it with one of the more
    /// specific variants below.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update or delete a category that does not exist.
    #[error("Category not found")]
    CategoryNotFound,

    /// Tried to update or delete a transaction that does not exist.
    #[error("Transaction not found")]
    TransactionNotFound,

    /// The datastore could not be reached or rejected the operation.
    ///
    /// The message is the underlying error text and is passed on to the
    /// client as is.
    #[error("{0}")]
    Storage(String),

    /// A stored document could not be converted to or from a record.
    #[error("could not convert between a record and a document: {0}")]
    Serialization(String),

    /// A spending total or percentage is too large to represent, e.g. the
    /// sum of several very large budgets.
    #[error("spending totals are out of range")]
    TotalOutOfRange,

    /// Could not acquire the lock for a store.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The server configuration is incomplete or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::Storage(error.to_string())
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        tracing::error!("a request to the datastore failed: {}", value);
        Error::Storage(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Serialization(value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        tracing::error!("an I/O error occurred: {}", value);
        Error::Storage(value.to_string())
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequestBody(rejection.status(), rejection.body_text())
    }
}

/// The JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// A human readable description of what went wrong.
    pub detail: String,
}

impl Error {
    /// The HTTP status code clients should receive for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidRequestBody(status, _) => *status,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotFound | Error::CategoryNotFound | Error::TransactionNotFound => {
                StatusCode::NOT_FOUND
            }
            Error::Storage(_)
            | Error::Serialization(_)
            | Error::TotalOutOfRange
            | Error::DatabaseLockError
            | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
        }

        (
            status,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}
