//! Twilio Messages API client for WhatsApp templates.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::calendar::BoxFuture;
use crate::error::{ProviderError, ProviderResult};
use crate::messaging::{MessageSender, OutboundMessage, SubmissionReceipt};

/// Twilio account configuration.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    /// Account SID (`AC...`).
    pub account_sid: String,
    /// Auth token for HTTP basic auth.
    pub auth_token: String,
    /// REST API base URL.
    pub api_base: String,
}

impl TwilioConfig {
    /// Twilio's REST API.
    pub const DEFAULT_API_BASE: &'static str = "https://api.twilio.com";

    /// Creates a configuration against the public API.
    pub fn new(account_sid: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            api_base: Self::DEFAULT_API_BASE.to_string(),
        }
    }

    /// Overrides the API base URL.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.account_sid.trim().is_empty() {
            return Err(ProviderError::configuration("twilio account_sid is required"));
        }
        if self.auth_token.trim().is_empty() {
            return Err(ProviderError::configuration("twilio auth_token is required"));
        }
        Ok(())
    }
}

/// Sends WhatsApp template messages through Twilio.
#[derive(Debug, Clone)]
pub struct TwilioClient {
    config: TwilioConfig,
    http_client: reqwest::Client,
}

impl TwilioClient {
    /// Creates a new client.
    pub fn new(config: TwilioConfig, timeout: Option<Duration>) -> ProviderResult<Self> {
        config.validate()?;
        let http_client = crate::http::build_client(timeout)?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            urlencoding::encode(&self.config.account_sid)
        )
    }

    async fn send(&self, message: &OutboundMessage) -> ProviderResult<SubmissionReceipt> {
        let variables = serde_json::to_string(&message.variables).map_err(|e| {
            ProviderError::internal(format!("failed to encode template variables: {}", e))
        })?;

        let params = [
            ("From", whatsapp_address(&message.from)),
            ("To", whatsapp_address(message.to.as_str())),
            ("ContentSid", message.template_id.clone()),
            ("ContentVariables", variables),
        ];

        let response = self
            .http_client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e).with_provider("twilio"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(rejection(status, &body));
        }

        let accepted: MessageResource = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse response: {}", e))
                .with_provider("twilio")
        })?;

        debug!("twilio accepted message {}", accepted.sid);
        Ok(SubmissionReceipt {
            message_id: accepted.sid,
            status: accepted.status,
        })
    }
}

impl MessageSender for TwilioClient {
    fn submit<'a>(
        &'a self,
        message: &'a OutboundMessage,
    ) -> BoxFuture<'a, ProviderResult<SubmissionReceipt>> {
        Box::pin(self.send(message))
    }
}

/// Prefixes `whatsapp:` unless already present.
fn whatsapp_address(number: &str) -> String {
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{}", number)
    }
}

/// Client-side rejections become delivery failures carrying Twilio's own code.
fn rejection(status: reqwest::StatusCode, body: &str) -> ProviderError {
    let err = match serde_json::from_str::<ApiError>(body) {
        Ok(api) if status.is_client_error() && status != reqwest::StatusCode::UNAUTHORIZED => {
            ProviderError::delivery(format!(
                "twilio error {}: {}",
                api.code.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string()),
                api.message.unwrap_or_default()
            ))
        }
        _ => ProviderError::from_status(status, body),
    };
    err.with_provider("twilio")
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<i64>,
    message: Option<String>,
}
