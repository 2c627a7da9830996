//! Error types for type-layer operations.

use std::fmt;

/// The primary error type for all sqlport operations.
///
/// Every variant records the operation that failed (`"quote"`,
/// `"convert_result"`, `"get_declaration"`, ...) together with a
/// human-readable detail message.
#[derive(Debug)]
pub enum Error {
    /// Type, operator or feature not known to this backend
    Unsupported(OperationError),
    /// Malformed input value (unparsable JSON, stale LOB reference, ...)
    Invalid(OperationError),
    /// No declaration handler for a resolved type
    NotFound(OperationError),
    /// Unrecoverable failure, typically I/O while writing a LOB
    Fatal(FatalError),
}

/// Classification of an [`Error`], independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unsupported,
    Invalid,
    NotFound,
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationError {
    /// Name of the failing operation
    pub operation: &'static str,
    /// Detail message
    pub message: String,
}

#[derive(Debug)]
pub struct FatalError {
    pub operation: &'static str,
    pub message: String,
    pub source: Option<std::io::Error>,
}

impl Error {
    /// Build an [`Error::Unsupported`].
    pub fn unsupported(operation: &'static str, message: impl Into<String>) -> Self {
        Error::Unsupported(OperationError {
            operation,
            message: message.into(),
        })
    }

    /// Build an [`Error::Invalid`].
    pub fn invalid(operation: &'static str, message: impl Into<String>) -> Self {
        Error::Invalid(OperationError {
            operation,
            message: message.into(),
        })
    }

    /// Build an [`Error::NotFound`].
    pub fn not_found(operation: &'static str, message: impl Into<String>) -> Self {
        Error::NotFound(OperationError {
            operation,
            message: message.into(),
        })
    }

    /// Build an [`Error::Fatal`], optionally wrapping the I/O error behind it.
    pub fn fatal(
        operation: &'static str,
        message: impl Into<String>,
        source: Option<std::io::Error>,
    ) -> Self {
        Error::Fatal(FatalError {
            operation,
            message: message.into(),
            source,
        })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Unsupported(_) => ErrorKind::Unsupported,
            Error::Invalid(_) => ErrorKind::Invalid,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Fatal(_) => ErrorKind::Fatal,
        }
    }

    /// Name of the operation that raised this error.
    pub fn operation(&self) -> &'static str {
        match self {
            Error::Unsupported(e) | Error::Invalid(e) | Error::NotFound(e) => e.operation,
            Error::Fatal(e) => e.operation,
        }
    }

    /// Detail message without the operation prefix.
    pub fn message(&self) -> &str {
        match self {
            Error::Unsupported(e) | Error::Invalid(e) | Error::NotFound(e) => &e.message,
            Error::Fatal(e) => &e.message,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::Unsupported(_))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Error::Invalid(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Fatal(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Unsupported(e) => write!(f, "Unsupported ({}): {}", e.operation, e.message),
            Error::Invalid(e) => write!(f, "Invalid ({}): {}", e.operation, e.message),
            Error::NotFound(e) => write!(f, "Not found ({}): {}", e.operation, e.message),
            Error::Fatal(e) => {
                if let Some(source) = &e.source {
                    write!(f, "Fatal ({}): {}: {}", e.operation, e.message, source)
                } else {
                    write!(f, "Fatal ({}): {}", e.operation, e.message)
                }
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Fatal(e) => e
                .source
                .as_ref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Fatal(FatalError {
            operation: "io",
            message: err.to_string(),
            source: Some(err),
        })
    }
}

/// Result type alias for sqlport operations.
pub type Result<T> = std::result::Result<T, Error>;
