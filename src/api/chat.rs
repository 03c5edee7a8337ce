//! Chat relay: forwards a user prompt to the configured generative-language
//! endpoint and returns the reply. The upstream API is opaque; its failures
//! surface as a generic 502. Keeping the relay server-side keeps the API key
//! out of the browser.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::session::Claims;
use crate::AppState;

use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

// Wire types for the generateContent API
#[derive(Debug, Serialize, Deserialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

fn extract_reply(response: GenerateContentResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .map(|p| p.text)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| "No reply.".to_string())
}

/// Relay endpoint. Requires a valid session.
///
/// POST /api/chat
pub async fn relay(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::bad_request("Message is required"));
    }

    let url = format!(
        "{}?key={}",
        state.config.chat.api_url, state.config.chat.api_key
    );
    let body = GenerateContentRequest {
        contents: vec![Content {
            parts: vec![Part {
                text: request.message,
            }],
        }],
    };

    let response = state.http.post(&url).json(&body).send().await.map_err(|e| {
        tracing::error!("Chat upstream request failed: {}", e);
        ApiError::upstream("Chat service unavailable")
    })?;

    if !response.status().is_success() {
        tracing::error!(status = %response.status(), "Chat upstream returned an error");
        return Err(ApiError::upstream("Chat service unavailable"));
    }

    let data: GenerateContentResponse = response.json().await.map_err(|e| {
        tracing::error!("Failed to parse chat upstream response: {}", e);
        ApiError::upstream("Chat service unavailable")
    })?;

    tracing::debug!(user = %claims.sub, "Chat reply relayed");

    Ok(Json(ChatResponse {
        reply: extract_reply(data),
    }))
}
