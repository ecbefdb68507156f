//! Client error types.

use std::fmt;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// Provider error.
    Provider(String),
    /// IO error.
    Io(std::io::Error),
    /// Consent is required before anything else can run.
    AuthorizationPending { url: String },
    /// The operator refused consent.
    AuthorizationDeclined(String),
    /// Time zone or date arithmetic failed.
    Time(String),
    /// The confirmation prompt could not be shown or was aborted.
    Prompt(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Provider(msg) => write!(f, "provider error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::AuthorizationPending { url } => {
                write!(f, "authorization required, visit: {}", url)
            }
            Self::AuthorizationDeclined(reason) => write!(f, "authorization declined: {}", reason),
            Self::Time(msg) => write!(f, "time error: {}", msg),
            Self::Prompt(msg) => write!(f, "prompt failed: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<promemoria_providers::ProviderError> for ClientError {
    fn from(err: promemoria_providers::ProviderError) -> Self {
        use promemoria_providers::ProviderErrorCode;

        match err.code() {
            ProviderErrorCode::ConfigurationError => Self::Config(err.message().to_string()),
            _ => Self::Provider(err.to_string()),
        }
    }
}

impl From<promemoria_core::TimeError> for ClientError {
    fn from(err: promemoria_core::TimeError) -> Self {
        Self::Time(err.to_string())
    }
}

impl From<inquire::InquireError> for ClientError {
    fn from(err: inquire::InquireError) -> Self {
        Self::Prompt(err.to_string())
    }
}
