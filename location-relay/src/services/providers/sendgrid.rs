use super::{EmailMessage, EmailProvider, ProviderError, ProviderResponse};
use crate::config::SendGridConfig;
use crate::utils::safe_str;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use std::time::Duration;

pub const MAX_SUBJECT_CHARS: usize = 200;
pub const MAX_BODY_CHARS: usize = 10_000;
pub const MAX_FROM_NAME_CHARS: usize = 120;
pub const MAX_REPLY_TO_CHARS: usize = 254;

const MAIL_SEND_PATH: &str = "/v3/mail/send";

/// SendGrid v3 mail-send client.
pub struct SendGridProvider {
    api_key: Secret<String>,
    endpoint: String,
    client: Client,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SendGridRequest {
    pub personalizations: Vec<Personalization>,
    pub from: SendGridAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<SendGridAddress>,
    pub subject: String,
    pub content: Vec<SendGridContent>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Personalization {
    pub to: Vec<SendGridAddress>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SendGridAddress {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SendGridContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub value: String,
}

impl SendGridRequest {
    /// Build the wire payload, sanitizing every free-text field.
    pub fn from_message(email: &EmailMessage) -> Self {
        Self {
            personalizations: vec![Personalization {
                to: vec![SendGridAddress {
                    email: email.to.clone(),
                    name: None,
                }],
            }],
            from: SendGridAddress {
                email: email.from.email.clone(),
                name: email
                    .from
                    .name
                    .as_deref()
                    .map(|name| safe_str(name, MAX_FROM_NAME_CHARS)),
            },
            reply_to: email.reply_to.as_deref().map(|addr| SendGridAddress {
                email: safe_str(addr, MAX_REPLY_TO_CHARS),
                name: None,
            }),
            subject: safe_str(&email.subject, MAX_SUBJECT_CHARS),
            content: vec![SendGridContent {
                content_type: "text/plain".to_string(),
                value: safe_str(&email.body, MAX_BODY_CHARS),
            }],
        }
    }
}

impl SendGridProvider {
    pub fn new(config: &SendGridConfig) -> Result<Self, ProviderError> {
        if config.api_key.expose_secret().is_empty() {
            return Err(ProviderError::Configuration(
                "SendGrid API key is empty".to_string(),
            ));
        }

        if config.timeout_secs == 0 {
            return Err(ProviderError::Configuration(
                "SendGrid timeout must be at least 1 second".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            api_key: Secret::new(config.api_key.expose_secret().clone()),
            endpoint: format!(
                "{}{}",
                config.api_base_url.trim_end_matches('/'),
                MAIL_SEND_PATH
            ),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EmailProvider for SendGridProvider {
    async fn send(&self, email: &EmailMessage) -> Result<ProviderResponse, ProviderError> {
        let payload = SendGridRequest::from_message(email);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                ProviderError::Connection(format!("Failed to connect to SendGrid: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let provider_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        tracing::info!(
            to = %email.to,
            provider_id = provider_id.as_deref().unwrap_or("-"),
            "Email accepted by SendGrid"
        );

        Ok(ProviderResponse::success(provider_id))
    }

    fn name(&self) -> &'static str {
        "sendgrid"
    }
}
