use crate::services::ProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures of the intake endpoint. Only the stable `code()` reaches the
/// client.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("missing or unknown access token")]
    InvalidToken,

    #[error("lat and lon must be numbers")]
    BadCoords,

    #[error("request body is not valid JSON: {0}")]
    MalformedBody(String),

    #[error("request body exceeds the size limit")]
    BodyTooLarge,

    #[error("email delivery failed: {0}")]
    EmailFailed(#[from] ProviderError),
}

impl IntakeError {
    pub fn code(&self) -> &'static str {
        match self {
            IntakeError::InvalidToken => "invalid_token",
            IntakeError::BadCoords => "bad_coords",
            IntakeError::MalformedBody(_) => "bad_json",
            IntakeError::BodyTooLarge => "body_too_large",
            IntakeError::EmailFailed(_) => "email_failed",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            IntakeError::InvalidToken => StatusCode::FORBIDDEN,
            IntakeError::BadCoords | IntakeError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            IntakeError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            IntakeError::EmailFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IntakeResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl IntakeResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(IntakeResponse {
                ok: false,
                error: Some(self.code()),
            }),
        )
            .into_response()
    }
}
