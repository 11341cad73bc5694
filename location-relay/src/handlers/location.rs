use crate::error::{IntakeError, IntakeResponse};
use crate::models::LocationSubmission;
use crate::services::{record_location_report, record_provider_call};
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::Value;

/// `POST /api/location`
#[tracing::instrument(skip(state, body))]
pub async fn submit_location(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<IntakeResponse>, IntakeError> {
    let result = relay_location(&state, body).await;

    match &result {
        Ok(_) => record_location_report("ok"),
        Err(e) => record_location_report(e.code()),
    }

    result
}

async fn relay_location(
    state: &AppState,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<IntakeResponse>, IntakeError> {
    let body = match body {
        Ok(Json(body)) => body,
        // Bodies sent without a JSON content type are read as empty.
        Err(JsonRejection::MissingJsonContentType(_)) => Value::Null,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            tracing::warn!("Rejected oversized intake body");
            return Err(IntakeError::BodyTooLarge);
        }
        Err(rejection) => {
            tracing::warn!(reason = %rejection.body_text(), "Rejected malformed intake body");
            return Err(IntakeError::MalformedBody(rejection.body_text()));
        }
    };

    let report =
        LocationSubmission::from_json(&body).into_report(state.tokens.as_ref(), Utc::now())?;

    // Evidence of receipt, whatever happens to the email.
    tracing::info!(
        token = %report.token,
        lat = report.lat,
        lon = report.lon,
        acc = ?report.acc,
        when = %report.when(),
        "location_received"
    );

    let email = report.to_email(&state.mail);
    let provider = state.email_provider.name();

    match state.email_provider.send(&email).await {
        Ok(response) => {
            record_provider_call(provider, "success");
            tracing::info!(
                token = %report.token,
                provider,
                provider_id = ?response.provider_id,
                "Location notification sent"
            );
            Ok(Json(IntakeResponse::ok()))
        }
        Err(e) => {
            record_provider_call(provider, "failure");
            tracing::error!(
                token = %report.token,
                provider,
                upstream_status = ?e.status(),
                error = %e,
                "email_failed"
            );
            Err(IntakeError::EmailFailed(e))
        }
    }
}
