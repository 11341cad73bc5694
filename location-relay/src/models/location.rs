use crate::config::MailConfig;
use crate::error::IntakeError;
use crate::services::{EmailMessage, Sender, TokenRegistry};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Largest epoch offset a browser `Date` accepts, in milliseconds.
const MAX_EPOCH_MILLIS: f64 = 8.64e15;

/// Raw intake body, before any validation. Fields keep their JSON form so
/// that a wrong type can be told apart from a missing field.
#[derive(Debug, Clone, Default)]
pub struct LocationSubmission {
    pub token: Option<Value>,
    pub lat: Option<Value>,
    pub lon: Option<Value>,
    pub acc: Option<Value>,
    pub ts: Option<Value>,
}

impl LocationSubmission {
    /// Non-object bodies yield an empty submission.
    pub fn from_json(body: &Value) -> Self {
        let field = |name: &str| body.get(name).cloned();
        Self {
            token: field("token"),
            lat: field("lat"),
            lon: field("lon"),
            acc: field("acc"),
            ts: field("ts"),
        }
    }

    /// The token is checked before the coordinates.
    pub fn into_report(
        self,
        registry: &dyn TokenRegistry,
        received_at: DateTime<Utc>,
    ) -> Result<LocationReport, IntakeError> {
        let token = match self.token {
            Some(Value::String(token)) if registry.is_valid(&token) => token,
            _ => return Err(IntakeError::InvalidToken),
        };

        let (lat, lon) = match (number(&self.lat), number(&self.lon)) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => return Err(IntakeError::BadCoords),
        };

        Ok(LocationReport {
            token,
            lat,
            lon,
            acc: number(&self.acc),
            captured_at: capture_time(number(&self.ts)).unwrap_or(received_at),
        })
    }
}

fn number(value: &Option<Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    }
}

fn capture_time(ts: Option<f64>) -> Option<DateTime<Utc>> {
    let ts = ts.filter(|ms| *ms != 0.0 && ms.abs() <= MAX_EPOCH_MILLIS)?;
    DateTime::from_timestamp_millis(ts.trunc() as i64)
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationReport {
    pub token: String,
    pub lat: f64,
    pub lon: f64,
    /// Accuracy radius in meters.
    pub acc: Option<f64>,
    pub captured_at: DateTime<Utc>,
}

impl LocationReport {
    /// ISO-8601 UTC with millisecond precision, e.g. `2023-11-14T22:13:20.000Z`.
    pub fn when(&self) -> String {
        self.captured_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn maps_url(&self) -> String {
        format!("https://www.google.com/maps?q={},{}", self.lat, self.lon)
    }

    pub fn subject(&self) -> String {
        format!("📍 Localização recebida ({})", self.token)
    }

    pub fn body(&self) -> String {
        let acc = self
            .acc
            .map(|acc| acc.to_string())
            .unwrap_or_else(|| "n/a".to_string());

        format!(
            "Token: {}\nQuando: {}\nLatitude: {}\nLongitude: {}\nPrecisão: {} m\nMaps: {}",
            self.token,
            self.when(),
            self.lat,
            self.lon,
            acc,
            self.maps_url()
        )
    }

    pub fn to_email(&self, mail: &MailConfig) -> EmailMessage {
        EmailMessage {
            to: mail.to_email.clone(),
            from: Sender {
                email: mail.from_email.clone(),
                name: mail.from_name.clone(),
            },
            reply_to: mail.reply_to.clone(),
            subject: self.subject(),
            body: self.body(),
        }
    }
}
