pub mod metrics;
pub mod providers;
pub mod tokens;

pub use metrics::{get_metrics, init_metrics, record_location_report, record_provider_call};
pub use providers::{
    EmailMessage, EmailProvider, MockEmailProvider, ProviderError, ProviderResponse,
    SendGridProvider, Sender,
};
pub use tokens::{StaticTokenRegistry, TokenRegistry};
