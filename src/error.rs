use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use reqwest::Error as REQWEST_ERROR;
use serde_json::Error as JSON_ERROR;
use std::{
    env::VarError, io::Error as IO_ERROR, num::ParseIntError,
    str::ParseBoolError as PARSE_BOOL_ERROR, sync::Arc,
};
use thiserror::Error;
use tokio::task::JoinError;
use tracing::subscriber::SetGlobalDefaultError as TRACING_GLOBAL_DEFAULT_ERROR;
use url::ParseError as URL_ERROR;

/// Fallback text for non-2xx responses without a usable `message`.
pub const GENERIC_API_ERROR: &str = "Error API";

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] IO_ERROR),

    #[error("{0}")]
    URL(#[from] URL_ERROR),

    #[error("{0}")]
    INT(#[from] ParseIntError),

    #[error("{0}")]
    VAR(#[from] VarError),

    #[error("{0}")]
    ParseBoolError(#[from] PARSE_BOOL_ERROR),

    #[error("{0}")]
    TokioJoinError(#[from] JoinError),

    #[error("{0}")]
    JsonError(#[from] JSON_ERROR),

    #[error("Tracing error: {0}")]
    SetGlobalDefaultError(#[from] TRACING_GLOBAL_DEFAULT_ERROR),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(REQWEST_ERROR),

    #[error("{0}")]
    ReqwestError(REQWEST_ERROR),

    #[error("Invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),

    #[error("Invalid option {option}")]
    InvalidOption { option: String },

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Task message error: {0}")]
    TaskError(String),

    /// Query failure still held by the cache or another caller
    #[error(transparent)]
    Shared(Arc<Error>),
}

impl Error {
    /// The underlying error, looking through shared query failures.
    pub fn root(&self) -> &Error {
        match self {
            Error::Shared(inner) => inner.root(),
            other => other,
        }
    }
}

impl From<REQWEST_ERROR> for Error {
    fn from(error: REQWEST_ERROR) -> Self {
        if error.is_connect() || error.is_timeout() || error.is_request() {
            Error::Network(error)
        } else {
            Error::ReqwestError(error)
        }
    }
}

/// Recovers an owned error from a query result shared between callers.
impl From<Arc<Error>> for Error {
    fn from(error: Arc<Error>) -> Self {
        Arc::try_unwrap(error).unwrap_or_else(Error::Shared)
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidMonth(_)
            | Error::InvalidOption { .. }
            | Error::InvalidBody(_)
            | Error::INT(_)
            | Error::ParseBoolError(_)
            | Error::JsonError(_) => StatusCode::BAD_REQUEST,

            Error::NotFound(_) => StatusCode::NOT_FOUND,

            Error::Api { .. } | Error::Network(_) | Error::ReqwestError(_) => {
                StatusCode::BAD_GATEWAY
            },

            Error::Io(_)
            | Error::URL(_)
            | Error::VAR(_)
            | Error::TokioJoinError(_)
            | Error::SetGlobalDefaultError(_)
            | Error::ConfigurationError(_)
            | Error::TaskError(_) => StatusCode::INTERNAL_SERVER_ERROR,

            Error::Shared(inner) => inner.status_code(),
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": status.canonical_reason().unwrap_or("Unknown"),
            "message": self.to_string(),
            "status": status.as_u16(),
        });
        HttpResponse::build(status).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_displays_server_message() {
        let error = Error::Api {
            status: 400,
            message: String::from("bad request"),
        };
        assert_eq!(error.to_string(), "bad request");
    }

    #[test]
    fn test_shared_error_keeps_api_message() {
        let shared = Arc::new(Error::Api {
            status: 400,
            message: String::from("bad request"),
        });
        let _other = Arc::clone(&shared);

        let error = Error::from(shared);
        assert!(matches!(error, Error::Shared(_)));
        assert!(matches!(error.root(), Error::Api { status: 400, .. }));
        assert_eq!(error.to_string(), "bad request");
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_unshared_error_is_unwrapped() {
        let error = Error::from(Arc::new(Error::NotFound(String::from("t9"))));
        assert!(matches!(error, Error::NotFound(_)));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::NotFound(String::from("t9")).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::InvalidMonth(String::from("2024-13")).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::ConfigurationError(String::from("PORT")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
