//! Unified error type.
//!
//! Every failure in a request's life travels up the handler chain as an
//! [`Error`]. The variants are the taxonomy the framework reasons about:
//!
//! | Kind | Variant | Client sees |
//! |---|---|---|
//! | Validation error | [`Error::Web`] with non-empty fields | its status + field list |
//! | Request error | [`Error::Web`] with no fields | its status + message |
//! | Shutdown signal | [`Error::Shutdown`] | nothing; the service terminates |
//! | Internal error | everything else | `500 Internal Server Error` |
//!
//! Kinds are told apart by matching on [`Error::root_cause`], never by
//! inspecting status codes or message text.

use std::fmt;
use std::time::Duration;

use http::StatusCode;
use serde::Serialize;

/// Boxed cause carried by a [`WebError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by strata's fallible operations and by handlers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error with web-specific context: a status code and, for
    /// validation failures, the offending fields.
    #[error(transparent)]
    Web(#[from] WebError),

    /// The per-request contract was violated. The service must shut down.
    #[error("{0}")]
    Shutdown(String),

    /// A handler panicked; the fault was contained and converted.
    #[error("panic: [{0}]")]
    Panic(String),

    /// Another error with a layer of context on top.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("http: {0}")]
    Http(#[from] hyper::Error),

    #[error("config: {0}")]
    Config(String),

    #[error("graceful shutdown did not complete within {0:?}")]
    ShutdownTimeout(Duration),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl Error {
    /// A request error carrying an explicit status code. Use it when a
    /// handler hits an expected, client-triggered failure.
    pub fn request(cause: impl Into<BoxError>, status: StatusCode) -> Self {
        Self::Web(WebError::new(cause, status))
    }

    /// A request error with `400 Bad Request`.
    pub fn bad_request(cause: impl Into<BoxError>) -> Self {
        Self::request(cause, StatusCode::BAD_REQUEST)
    }

    /// A `400 Bad Request` built from a message, e.g.
    /// `Error::invalid(format!("namespace must be [{want}]"))`.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::bad_request(message.into())
    }

    /// A validation failure listing every violated field.
    pub fn validation(fields: Vec<FieldError>) -> Self {
        Self::Web(WebError::new("field validation error", StatusCode::BAD_REQUEST).with_fields(fields))
    }

    /// The signal that asks the framework to terminate gracefully.
    pub fn shutdown(message: impl Into<String>) -> Self {
        Self::Shutdown(message.into())
    }

    pub fn internal(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self::Internal(anyhow::Error::msg(message))
    }

    /// Wraps `self` with a message, keeping it reachable via [`root_cause`](Self::root_cause).
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context { context: context.into(), source: Box::new(self) }
    }

    /// Peels off every [`Error::Context`] layer.
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(self.root_cause(), Self::Shutdown(_))
    }

    /// The [`WebError`] at the root of this error, if there is one.
    pub fn as_web(&self) -> Option<&WebError> {
        match self.root_cause() {
            Self::Web(web) => Some(web),
            _ => None,
        }
    }
}

// ── WebError ─────────────────────────────────────────────────────────────────

/// An error that knows which HTTP status it maps to.
///
/// `fields` is non-empty only for validation failures.
#[derive(Debug, thiserror::Error)]
#[error("{cause}")]
pub struct WebError {
    cause: BoxError,
    status: StatusCode,
    fields: Vec<FieldError>,
}

impl WebError {
    pub fn new(cause: impl Into<BoxError>, status: StatusCode) -> Self {
        Self { cause: cause.into(), status, fields: Vec::new() }
    }

    pub fn with_fields(mut self, fields: Vec<FieldError>) -> Self {
        self.fields = fields;
        self
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn fields(&self) -> &[FieldError] { &self.fields }
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) { &*self.cause }
}

/// One violated constraint on one request field.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FieldError {
    #[serde(rename = "Field")]
    pub field: String,
    #[serde(rename = "Error")]
    pub error: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self { field: field.into(), error: error.into() }
    }
}
