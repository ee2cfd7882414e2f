use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::services::conversation;
use crate::state::AppState;

/// The slice of a Telegram `Update` this bot cares about. Everything else
/// in the payload is ignored by serde.
#[derive(Deserialize)]
#[allow(dead_code)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

#[derive(Deserialize)]
pub struct TelegramMessage {
    pub chat: TelegramChat,
    pub text: Option<String>,
}

#[derive(Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

pub async fn telegram_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(update): Json<TelegramUpdate>,
) -> Response {
    // Verify the secret token Telegram echoes back (skip if unset, dev mode)
    if !state.config.telegram_webhook_secret.is_empty() {
        let secret = headers
            .get("x-telegram-bot-api-secret-token")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if secret != state.config.telegram_webhook_secret {
            tracing::warn!("invalid webhook secret token");
            return (StatusCode::FORBIDDEN, "Invalid secret token").into_response();
        }
    }

    // Edited messages, channel posts and text-less updates are not ours.
    let Some(message) = update.message else {
        return StatusCode::OK.into_response();
    };
    let chat_id = message.chat.id;
    let Some(text) = message.text else {
        return StatusCode::OK.into_response();
    };
    let text = text.trim().to_string();
    if text.is_empty() {
        return StatusCode::OK.into_response();
    }

    tracing::info!(chat_id, text = %text, "incoming message");

    match conversation::process_message(&state, chat_id, &text).await {
        Ok(reply) => {
            if let Err(e) = state.transport.send_message(chat_id, &reply).await {
                tracing::error!(error = %e, chat_id, "failed to send reply");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, chat_id, "conversation processing failed");
            let fallback = "Sorry, I'm having trouble right now. Please try again in a moment.";
            let _ = state.transport.send_message(chat_id, fallback).await;
        }
    }

    // Always 200 so Telegram does not retry delivered updates.
    StatusCode::OK.into_response()
}
