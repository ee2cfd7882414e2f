use std::sync::Arc;

use crate::models::BookingStage;
use crate::services::ai::fallback::{fallback_reply, FALLBACK_APOLOGY};
use crate::services::booking::{wants_booking, BookingEngine};
use crate::services::directory;
use crate::state::AppState;

/// Phrases that read as a plain greeting when nothing else matches.
const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
];

fn is_greeting(message: &str) -> bool {
    let lower = message.to_lowercase();
    GREETINGS.iter().any(|g| lower.contains(g))
}

/// Routes one inbound message to a reply: reset first, then the booking
/// machine when a booking is underway or requested, then symptom and
/// greeting shortcuts, and the LLM persona for everything else.
///
/// The session is written back only on success. When the engine fails the
/// chat stays where it was so the user's retry replays the same stage.
pub async fn process_message(
    state: &Arc<AppState>,
    chat_id: i64,
    message: &str,
) -> anyhow::Result<String> {
    let msg = message.trim();

    if msg.eq_ignore_ascii_case("reset") {
        state.sessions.reset(chat_id);
        return Ok("Chat has been reset.".to_string());
    }

    let mut session = state.sessions.get_or_create(chat_id);
    // The fallback prompt appends the current message itself.
    let prior_history = session.history.clone();
    session.remember("user", msg);

    tracing::info!(chat_id, stage = session.stage.as_str(), "processing message");

    let engine = BookingEngine {
        directory: state.directory.as_ref(),
        appointments: state.appointments.as_ref(),
        mailer: state.mailer.as_ref(),
        clinic_name: &state.config.clinic_name,
    };

    // A booking in progress owns the chat until it completes or is reset.
    if session.stage != BookingStage::Idle {
        let reply = engine.advance(&mut session, msg).await?;
        state.sessions.save(session);
        return Ok(reply);
    }

    if wants_booking(msg) {
        let reply = engine.advance(&mut session, msg).await?;
        state.sessions.save(session);
        return Ok(reply);
    }

    // Symptoms alone get a recommendation, not a booking.
    let doctors = state.directory.list()?;
    if let Some((_, name)) = directory::doctor_for_symptoms(&doctors, msg) {
        let reply = format!(
            "I'm really sorry you're experiencing that. You might consider seeing {name}, \
             who specializes in that area. If you would like to book an appointment now, \
             just type the word 'appointment'."
        );
        session.remember("assistant", &reply);
        state.sessions.save(session);
        return Ok(reply);
    }

    if is_greeting(msg) {
        let reply = format!(
            "Hey there! Welcome to {}. How can I help you today? If you'd like to book an \
             appointment or ask about symptoms, I'm here for you.",
            state.config.clinic_name
        );
        session.remember("assistant", &reply);
        state.sessions.save(session);
        return Ok(reply);
    }

    let reply = match fallback_reply(
        state.llm.as_ref(),
        &state.config.clinic_name,
        &prior_history,
        msg,
    )
    .await
    {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(chat_id, error = %e, "llm fallback failed");
            FALLBACK_APOLOGY.to_string()
        }
    };
    session.remember("assistant", &reply);
    state.sessions.save(session);
    Ok(reply)
}
