//! Mailbox store error types.

use thiserror::Error;

/// Error codes reported by mailbox stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InternalError,
    MailboxAlreadyExists,
    MailboxNotFound,
    MessageNotFound,
    StoreUnavailable,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InternalError => "InternalError",
            ErrorCode::MailboxAlreadyExists => "MailboxAlreadyExists",
            ErrorCode::MailboxNotFound => "MailboxNotFound",
            ErrorCode::MessageNotFound => "MessageNotFound",
            ErrorCode::StoreUnavailable => "StoreUnavailable",
        }
    }

    /// Returns the default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InternalError => "The store encountered an internal error.",
            ErrorCode::MailboxAlreadyExists => "The specified mailbox already exists.",
            ErrorCode::MailboxNotFound => "The specified mailbox does not exist.",
            ErrorCode::MessageNotFound => "The specified message does not exist.",
            ErrorCode::StoreUnavailable => "The store is not available.",
        }
    }

    /// Whether retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorCode::StoreUnavailable | ErrorCode::InternalError)
    }
}

/// Storage error with code and message.
#[derive(Debug, Error)]
#[error("{code:?}: {message}")]
pub struct StorageError {
    pub code: ErrorCode,
    pub message: String,
}

impl StorageError {
    /// Creates a new storage error with the given code and default message.
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.default_message().to_string(),
            code,
        }
    }

    /// Creates a new storage error with a custom message.
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::MessageNotFound,
            std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::TimedOut => {
                ErrorCode::StoreUnavailable
            }
            _ => ErrorCode::InternalError,
        };
        StorageError::with_message(code, err.to_string())
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
