//! Bearer-authenticated JSON GETs shared by the Calendar and People clients.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

use super::credential::Credential;

#[derive(Debug, Clone)]
pub(crate) struct GoogleApi {
    http_client: reqwest::Client,
    access_token: String,
    base: String,
}

impl GoogleApi {
    pub(crate) fn new(
        credential: &Credential,
        base: impl Into<String>,
        timeout: Option<Duration>,
    ) -> ProviderResult<Self> {
        let http_client = crate::http::build_client(timeout)?;

        Ok(Self {
            http_client,
            access_token: credential.access_token.clone(),
            base: base.into().trim_end_matches('/').to_string(),
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> ProviderResult<T> {
        debug!("GET {}", url);
        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e).with_provider("google"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &body).with_provider("google"));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse response: {}", e))
                .with_provider("google")
        })
    }
}
