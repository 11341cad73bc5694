use crate::startup::AppState;
use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

pub const INVALID_LINK_MESSAGE: &str = "Link inválido.";

/// Geolocation capture page, pre-addressed to a single token.
#[derive(Template)]
#[template(path = "location.html")]
pub struct LocationPage {
    /// Already a complete JavaScript string literal.
    pub token_literal: String,
}

/// Render the page for a token the caller has already validated.
pub fn render_page(token: &str) -> LocationPage {
    LocationPage {
        token_literal: js_string_literal(token),
    }
}

/// Quote `value` as a JavaScript string literal that is also safe inside an
/// HTML `<script>` element.
fn js_string_literal(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    let mut out = String::with_capacity(quoted.len());
    for c in quoted.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out
}

pub async fn location_page(State(state): State<AppState>, Path(token): Path<String>) -> Response {
    if !state.tokens.is_valid(&token) {
        tracing::info!("Location page requested with unknown token");
        return (StatusCode::NOT_FOUND, INVALID_LINK_MESSAGE).into_response();
    }

    render_page(&token).into_response()
}
