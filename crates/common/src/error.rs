//! Common error types and handling for the LabLink client

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the LabLink client
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),

    #[error("Request error: {0}")]
    Request(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// All credential recovery attempts are exhausted; the caller should
    /// route the user to sign-in and return them to `return_to` afterwards.
    #[error("Sign-in required (wanted {return_to})")]
    SignInRequired { return_to: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Whether this error means the user must sign in again
    pub fn is_sign_in_required(&self) -> bool {
        matches!(self, Error::SignInRequired { .. })
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
