//! Shared reqwest client construction.

use std::time::Duration;

use crate::error::{ProviderError, ProviderResult};

/// Builds the HTTP client used by every provider.
///
/// Without a configured timeout, requests run under reqwest's own defaults.
pub(crate) fn build_client(timeout: Option<Duration>) -> ProviderResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| ProviderError::internal(format!("failed to create HTTP client: {}", e)))
}
