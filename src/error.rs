use serde::Serialize;
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// An account with this email already exists.
    #[error("Email already registered")]
    DuplicateEmail,

    /// The email/password pair did not match a stored account.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A form field failed validation.
    #[error("Validation failed for {field}: {reason}")]
    ValidationFailed { field: String, reason: String },

    /// The submitted verification code does not match the issued one.
    #[error("Verification code mismatch")]
    CodeMismatch,

    /// The verification code outlived its countdown.
    #[error("Verification code expired")]
    CodeExpired,

    /// A resend was requested while the countdown is still running.
    #[error("Resend available in {remaining_secs}s")]
    ResendUnavailable { remaining_secs: i64 },

    /// The reset flow received an action its current step does not accept.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// A submission is already in flight for this form.
    #[error("Request already in progress")]
    Busy,

    /// A resource not found error.
    #[error("Resource not found")]
    NotFound,

    /// The operation requires an active session.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// A key-value store error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] sonic_rs::Error),

    /// An I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A hashing error.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// An internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Shorthand for a `ValidationFailed` error.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::ValidationFailed {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Converts the error into the message shown next to the form.
    ///
    /// Logs at a level matching the severity; internal details never reach the
    /// returned message.
    pub fn into_response(self) -> ErrorResponse {
        let (field, message) = match self {
            AppError::DuplicateEmail => {
                tracing::debug!("Duplicate email on signup");
                (
                    Some("email".to_string()),
                    "This email is already registered. Try logging in.".to_string(),
                )
            }

            AppError::InvalidCredentials => {
                tracing::warn!("Authentication failed");
                (
                    None,
                    "Invalid credentials. Check your email and password.".to_string(),
                )
            }

            AppError::ValidationFailed { field, reason } => {
                tracing::debug!("Validation error on {}: {}", field, reason);
                (Some(field), reason)
            }

            AppError::CodeMismatch => {
                tracing::debug!("Verification code mismatch");
                (
                    Some("code".to_string()),
                    "Invalid code. Check it and try again.".to_string(),
                )
            }

            AppError::CodeExpired => {
                tracing::debug!("Verification code expired");
                (
                    Some("code".to_string()),
                    "Code expired. Request a new one.".to_string(),
                )
            }

            AppError::ResendUnavailable { remaining_secs } => {
                tracing::debug!("Resend blocked for {}s", remaining_secs);
                (
                    None,
                    format!("You can request a new code in {} seconds.", remaining_secs),
                )
            }

            AppError::InvalidTransition(ref msg) => {
                tracing::warn!("Invalid reset transition: {}", msg);
                (None, "This step is not available right now.".to_string())
            }

            AppError::Busy => {
                tracing::debug!("Submission ignored, request in flight");
                (None, "Please wait, a request is already in progress.".to_string())
            }

            AppError::NotFound => {
                tracing::debug!("Resource not found");
                (None, "Account not found.".to_string())
            }

            AppError::NotAuthenticated => {
                tracing::debug!("No active session");
                (None, "Please log in to continue.".to_string())
            }

            AppError::Storage(ref msg) => {
                tracing::error!("Storage error: {}", msg);
                (None, "Could not access local data.".to_string())
            }

            AppError::Serialization(ref e) => {
                tracing::error!("Serialization error: {}", e);
                (None, "Could not read local data.".to_string())
            }

            AppError::Io(ref e) => {
                tracing::error!("IO error: {}", e);
                (None, "Could not access local data.".to_string())
            }

            AppError::Encryption(ref msg) => {
                tracing::error!("Encryption error: {}", msg);
                (None, "Something went wrong. Try again.".to_string())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (None, "Something went wrong. Try again.".to_string())
            }
        };

        ErrorResponse {
            success: false,
            field,
            message,
        }
    }
}

/// The user-facing shape of a failed form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    /// The field to highlight, when the failure belongs to one.
    pub field: Option<String>,
    pub message: String,
}
