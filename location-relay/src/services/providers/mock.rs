use super::{EmailMessage, EmailProvider, ProviderError, ProviderResponse};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// In-memory email provider for testing
pub struct MockEmailProvider {
    failure: Option<(u16, String)>,
    send_count: AtomicU64,
    sent: Mutex<Vec<EmailMessage>>,
}

impl MockEmailProvider {
    pub fn new() -> Self {
        Self {
            failure: None,
            send_count: AtomicU64::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// A provider that rejects every message with the given upstream status.
    pub fn failing(status: u16, body: impl Into<String>) -> Self {
        Self {
            failure: Some((status, body.into())),
            ..Self::new()
        }
    }

    /// Number of delivery attempts, successful or not.
    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }

    /// Messages handed to the provider, in order.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl Default for MockEmailProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    async fn send(&self, email: &EmailMessage) -> Result<ProviderResponse, ProviderError> {
        let attempt = self.send_count.fetch_add(1, Ordering::SeqCst) + 1;

        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email.clone());
        }

        if let Some((status, body)) = &self.failure {
            return Err(ProviderError::Rejected {
                status: *status,
                body: body.clone(),
            });
        }

        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "[MOCK] Email would be sent"
        );

        Ok(ProviderResponse::success(Some(format!(
            "mock-email-{}",
            attempt
        ))))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
