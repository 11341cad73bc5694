use secrecy::Secret;
use service_core::config::{self as core_config, ConfigSource, EnvLoader};
use service_core::error::AppError;

pub const DEFAULT_SENDGRID_API_BASE_URL: &str = "https://api.sendgrid.com";
pub const DEFAULT_SENDGRID_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_INTAKE_RATE_LIMIT_PER_MINUTE: u32 = 30;

#[derive(Debug)]
pub struct RelayConfig {
    pub common: core_config::Config,
    pub sendgrid: SendGridConfig,
    pub mail: MailConfig,
    /// `None` falls back to the built-in token set.
    pub access_tokens: Option<Vec<String>>,
    /// Zero disables intake rate limiting.
    pub intake_rate_limit_per_minute: u32,
    /// Key the intake limiter on `x-forwarded-for` (right-most hop).
    pub trust_proxy_headers: bool,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug)]
pub struct SendGridConfig {
    pub api_key: Secret<String>,
    pub api_base_url: String,
    pub timeout_secs: u64,
}

/// Addressing for every notification the relay sends.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub to_email: String,
    pub from_email: String,
    pub from_name: Option<String>,
    pub reply_to: Option<String>,
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Ok(Self::from_loader(common, &EnvLoader::from_env())?)
    }

    pub fn from_loader<S: ConfigSource>(
        common: core_config::Config,
        env: &EnvLoader<S>,
    ) -> Result<Self, core_config::ConfigError> {
        Ok(RelayConfig {
            common,
            sendgrid: SendGridConfig {
                api_key: Secret::new(env.get_required("SENDGRID_API_KEY")?),
                api_base_url: env
                    .get_optional("SENDGRID_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_SENDGRID_API_BASE_URL.to_string()),
                timeout_secs: positive_secs(
                    "SENDGRID_TIMEOUT_SECS",
                    env.get_parsed("SENDGRID_TIMEOUT_SECS", DEFAULT_SENDGRID_TIMEOUT_SECS)?,
                )?,
            },
            mail: MailConfig {
                to_email: env.get_required("TO_EMAIL")?,
                from_email: env.get_required("FROM_EMAIL")?,
                from_name: env.get_optional("FROM_NAME"),
                reply_to: env.get_optional("REPLY_TO"),
            },
            access_tokens: env.get_optional("ACCESS_TOKENS").map(|raw| parse_token_list(&raw)),
            intake_rate_limit_per_minute: env.get_parsed(
                "INTAKE_RATE_LIMIT_PER_MINUTE",
                DEFAULT_INTAKE_RATE_LIMIT_PER_MINUTE,
            )?,
            trust_proxy_headers: env.get_parsed("TRUST_PROXY_HEADERS", false)?,
            otlp_endpoint: env.get_optional("OTLP_ENDPOINT"),
        })
    }
}

fn positive_secs(name: &str, secs: u64) -> Result<u64, core_config::ConfigError> {
    if secs == 0 {
        return Err(core_config::ConfigError::Invalid {
            name: name.to_string(),
            reason: "must be at least 1 second".to_string(),
        });
    }
    Ok(secs)
}

fn parse_token_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
