//! Error types for provider operations.
//!
//! Every external collaborator (Google OAuth, Calendar, People, Twilio)
//! reports failures as a [`ProviderError`] tagged with a [`ProviderErrorCode`].

use std::fmt;
use thiserror::Error;

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Authentication failed or credentials are invalid/expired.
    AuthenticationFailed,
    /// Authorization failed - the account lacks permission.
    AuthorizationFailed,
    /// Network error - connection failed, timeout, DNS resolution, etc.
    NetworkError,
    /// Rate limit exceeded - too many requests.
    RateLimited,
    /// Server returned an error (5xx status codes).
    ServerError,
    /// Invalid response from the server - parse error, unexpected format.
    InvalidResponse,
    /// Resource not found (404).
    NotFound,
    /// Request was invalid (400) - bad parameters, malformed request.
    BadRequest,
    /// Configuration error - missing or invalid config.
    ConfigurationError,
    /// Local storage (credential file) could not be read or written.
    StorageError,
    /// The messaging provider refused a message.
    DeliveryFailed,
    /// Internal provider error - unexpected state, bug.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns true if this error is transient.
    ///
    /// Nothing retries automatically; this only classifies the failure for logs.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::RateLimited | Self::ServerError
        )
    }

    /// Returns a human-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
            Self::StorageError => "storage_error",
            Self::DeliveryFailed => "delivery_failed",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while talking to an external provider.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// The provider that generated this error (e.g., "google", "twilio").
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    /// Creates an authorization error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthorizationFailed, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    /// Creates a rate limit error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimited, message)
    }

    /// Creates a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::BadRequest, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::StorageError, message)
    }

    /// Creates a delivery error.
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::DeliveryFailed, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Maps a non-success HTTP status to the matching error code.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = format!("API error ({}): {}", status, body);
        match status.as_u16() {
            400 => Self::bad_request(message),
            401 => Self::authentication(message),
            403 => Self::authorization(message),
            404 => Self::not_found(message),
            429 => Self::rate_limited(message),
            500..=599 => Self::server(message),
            _ => Self::invalid_response(message),
        }
    }

    /// Classifies a transport-level reqwest failure.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("request timeout")
        } else if err.is_connect() {
            Self::network(format!("connection failed: {}", err))
        } else {
            Self::network(format!("request failed: {}", err))
        }
    }

    /// Sets the provider name for this error.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the provider name, if set.
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Returns true if this error is transient.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
