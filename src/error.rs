//! Error taxonomy
//!
//! Every failure leaving this crate is one of three kinds. Native failures
//! are classified once, by [`translate`], which keeps the innermost cause of
//! the native error chain as the `source()` of the resulting error.

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Result type used across the crate
pub type Result<T> = std::result::Result<T, ClientError>;

/// The three kinds of failure a caller can observe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid or contradictory connection parameters
    Configuration,
    /// The underlying connection could not be established
    Connection,
    /// A command was sent and failed
    Command,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::Connection => write!(f, "connection"),
            ErrorKind::Command => write!(f, "command"),
        }
    }
}

/// Typed client error
///
/// The message is the original failure message, verbatim, so callers can
/// match on the store's own error strings (`WRONGTYPE ...`, `ERR no such key`).
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{message}")]
    Configuration {
        message: String,
        #[source]
        cause: Option<NativeError>,
    },

    #[error("{message}")]
    Connection {
        message: String,
        #[source]
        cause: Option<NativeError>,
    },

    #[error("{message}")]
    Command {
        message: String,
        #[source]
        cause: Option<NativeError>,
    },
}

impl ClientError {
    /// Configuration error raised by this crate, no native cause
    pub fn configuration(message: impl Into<String>) -> Self {
        ClientError::Configuration {
            message: message.into(),
            cause: None,
        }
    }

    /// Command error raised by this crate, no native cause
    pub fn command(message: impl Into<String>) -> Self {
        ClientError::Command {
            message: message.into(),
            cause: None,
        }
    }

    /// Connection error raised by this crate, no native cause
    pub fn connection(message: impl Into<String>) -> Self {
        ClientError::Connection {
            message: message.into(),
            cause: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Configuration { .. } => ErrorKind::Configuration,
            ClientError::Connection { .. } => ErrorKind::Connection,
            ClientError::Command { .. } => ErrorKind::Command,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ClientError::Configuration { message, .. }
            | ClientError::Connection { message, .. }
            | ClientError::Command { message, .. } => message,
        }
    }

    /// The innermost native failure, if the error came from the native layer
    pub fn root_cause(&self) -> Option<&NativeError> {
        match self {
            ClientError::Configuration { cause, .. }
            | ClientError::Connection { cause, .. }
            | ClientError::Command { cause, .. } => cause.as_ref(),
        }
    }

    /// Re-classify under another kind, keeping message and root cause
    pub(crate) fn into_kind(self, kind: ErrorKind) -> Self {
        if self.kind() == kind {
            return self;
        }
        let (message, cause) = match self {
            ClientError::Configuration { message, cause }
            | ClientError::Connection { message, cause }
            | ClientError::Command { message, cause } => (message, cause),
        };
        build(kind, message, cause)
    }
}

/// A failure reported by a native handle
///
/// Owned and chained, so that the chain can be walked and its innermost
/// link moved into a [`ClientError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    message: String,
    cause: Option<Box<NativeError>>,
}

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        NativeError {
            message: message.into(),
            cause: None,
        }
    }

    /// Wrap `cause` under a new message
    pub fn with_cause(message: impl Into<String>, cause: NativeError) -> Self {
        NativeError {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Capture any error together with its `source()` chain
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        NativeError {
            message: err.to_string(),
            cause: err.source().map(|inner| Box::new(NativeError::from_error(inner))),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Walk the cause chain to its end
    pub fn root(&self) -> &NativeError {
        let mut current = self;
        while let Some(next) = current.cause.as_deref() {
            current = next;
        }
        current
    }

    /// Consume the chain, keeping only its innermost link
    pub fn into_root(self) -> NativeError {
        let mut current = self;
        while let Some(next) = current.cause.take() {
            current = *next;
        }
        current
    }

    /// Number of links in the chain (1 for a bare error)
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut current = self;
        while let Some(next) = current.cause.as_deref() {
            depth += 1;
            current = next;
        }
        depth
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for NativeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn StdError + 'static))
    }
}

impl From<redis::RedisError> for NativeError {
    fn from(err: redis::RedisError) -> Self {
        NativeError::from_error(&err)
    }
}

impl From<std::io::Error> for NativeError {
    fn from(err: std::io::Error) -> Self {
        NativeError::from_error(&err)
    }
}

/// Classify a native failure as `kind`
///
/// The resulting error keeps the failure's own message and carries exactly
/// one cause: the innermost link of the native chain.
pub fn translate(kind: ErrorKind, failure: NativeError) -> ClientError {
    let message = failure.message.clone();
    build(kind, message, Some(failure.into_root()))
}

fn build(kind: ErrorKind, message: String, cause: Option<NativeError>) -> ClientError {
    match kind {
        ErrorKind::Configuration => ClientError::Configuration { message, cause },
        ErrorKind::Connection => ClientError::Connection { message, cause },
        ErrorKind::Command => ClientError::Command { message, cause },
    }
}
