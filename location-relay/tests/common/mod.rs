use location_relay::config::{MailConfig, RelayConfig, SendGridConfig};
use location_relay::services::{MockEmailProvider, StaticTokenRegistry};
use location_relay::startup::Application;
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;

pub const VALID_TOKEN: &str = "ABC123";

pub struct TestApp {
    pub address: String,
    pub provider: Arc<MockEmailProvider>,
    pub client: reqwest::Client,
}

fn test_config(intake_rate_limit_per_minute: u32) -> RelayConfig {
    RelayConfig {
        // Use random port for testing (port 0)
        common: CoreConfig {
            port: 0,
            bind_address: "127.0.0.1".to_string(),
        },
        sendgrid: SendGridConfig {
            api_key: Secret::new("SG.test".to_string()),
            api_base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
        },
        mail: MailConfig {
            to_email: "owner@example.com".to_string(),
            from_email: "relay@example.com".to_string(),
            from_name: Some("Location Relay".to_string()),
            reply_to: Some("owner@example.com".to_string()),
        },
        access_tokens: None,
        intake_rate_limit_per_minute,
        trust_proxy_headers: false,
        otlp_endpoint: None,
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(MockEmailProvider::new(), 0).await
    }

    pub async fn spawn_with(provider: MockEmailProvider, intake_rate_limit_per_minute: u32) -> Self {
        let provider = Arc::new(provider);
        let config = test_config(intake_rate_limit_per_minute);

        let app = Application::build(
            &config,
            provider.clone(),
            Arc::new(StaticTokenRegistry::new([VALID_TOKEN])),
        )
        .await
        .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client.get(format!("{}/", address)).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            provider,
            client,
        }
    }

    pub async fn post_location(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/location", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }
}
