//! Unified error type and the status/code mappings built on top of it.
//!
//! A handler fails by returning `Err(Error)` (or by panicking, which the
//! dispatcher and the error-handling filter treat the same way). What status a
//! failure becomes depends on who translates it:
//!
//! | Kind | Dispatcher | Method-override dispatcher | Typed route |
//! |---|---|---|---|
//! | `Unauthorized` | 500 | 500 | 401 |
//! | `Forbidden` | 500 | 500 | 403 |
//! | `NotFound` | 500 | 500 | 404 |
//! | `UnsupportedContentType` | 500 | 500 | 400 |
//! | `PathParam` | 500 | 400 | 400 |
//! | anything else | 500 | 500 | 400 |

use std::any::Any;

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::response::Response;

/// The error type returned by switchyard's fallible operations and by handlers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown HTTP method `{0}`")]
    UnknownMethod(String),

    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    PathParam(#[from] PathParamError),

    #[error("unsupported content type `{0}`")]
    UnsupportedContentType(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("handler panicked: {0}")]
    Panic(String),

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// A path parameter was missing or did not parse as the requested type.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathParamError {
    #[error("missing path parameter `{0}`")]
    Missing(String),

    #[error("path parameter `{name}` has invalid value `{value}`")]
    Invalid { name: String, value: String },
}

/// The closed set of failure kinds, used for status/code mapping.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    BadRequest,
    Config,
    Forbidden,
    Internal,
    InvalidPattern,
    Json,
    NotFound,
    PathParam,
    Unauthorized,
    UnknownMethod,
    UnsupportedContentType,
}

impl Error {
    /// Wraps any foreign error as [`Error::Other`].
    pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(err.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest(_)             => ErrorKind::BadRequest,
            Self::Config(_)                 => ErrorKind::Config,
            Self::Forbidden(_)              => ErrorKind::Forbidden,
            Self::InvalidPattern { .. }     => ErrorKind::InvalidPattern,
            Self::Io(_)                     => ErrorKind::Internal,
            Self::Json(_)                   => ErrorKind::Json,
            Self::NotFound(_)               => ErrorKind::NotFound,
            Self::Other(_)                  => ErrorKind::Internal,
            Self::Panic(_)                  => ErrorKind::Internal,
            Self::PathParam(_)              => ErrorKind::PathParam,
            Self::Unauthorized(_)           => ErrorKind::Unauthorized,
            Self::UnknownMethod(_)          => ErrorKind::UnknownMethod,
            Self::UnsupportedContentType(_) => ErrorKind::UnsupportedContentType,
        }
    }

    /// 500 `INTERNAL_ERROR` with the failure message embedded.
    pub fn to_internal_response(&self) -> Response {
        internal_error(&self.to_string())
    }

    /// The typed-route mapping: auth and lookup kinds keep their status,
    /// everything else becomes a 400.
    pub fn to_typed_response(&self) -> Response {
        let (status, code) = typed_status(self.kind());
        Response::error(status, self.to_string(), code)
    }
}

fn typed_status(kind: ErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ErrorKind::Unauthorized           => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        ErrorKind::Forbidden              => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        ErrorKind::NotFound               => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ErrorKind::UnsupportedContentType => (StatusCode::BAD_REQUEST, "UNSUPPORTED_CONTENT_TYPE"),
        ErrorKind::BadRequest
        | ErrorKind::Config
        | ErrorKind::Internal
        | ErrorKind::InvalidPattern
        | ErrorKind::Json
        | ErrorKind::PathParam
        | ErrorKind::UnknownMethod        => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
    }
}

/// Body of every structured error response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub code: String,
}

pub(crate) fn internal_error(message: &str) -> Response {
    Response::error(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Internal server error: {message}"),
        "INTERNAL_ERROR",
    )
}

/// Extracts a printable message from a `catch_unwind` payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
