use super::{LlmProvider, Message};
use crate::models::ChatLine;

/// Reply used whenever the text-completion call fails; the conversation
/// keeps going.
pub const FALLBACK_APOLOGY: &str =
    "I'm here to help, but something went wrong. Could you please rephrase that?";

/// Persona for everything that is not part of the booking flow. The one
/// hard rule: the booking flow only starts on the literal word
/// "appointment", so the assistant must keep steering people to type it
/// rather than accept a "yes" or an "okay".
fn persona_prompt(clinic_name: &str) -> String {
    format!(
        "You are a friendly, empathetic and very human admin assistant for {clinic_name}, \
         an Edinburgh-based clinic. Reply in a warm, conversational tone and keep every \
         exchange inside the space of a healthcare admin: small talk is fine, light general \
         medical advice is fine, anything else is not your job. Always steer the \
         conversation toward booking an appointment. Whenever booking comes up, tell the \
         user to type the word \"appointment\" to start the process, and never treat a \
         \"yes\", \"okay\" or other confirmation as that trigger - ask them for the word \
         itself. If their symptoms sound serious, gently urge them to book. Keep replies \
         short and tidy, and use British terminology."
    )
}

/// Forward the conversation so far plus the new message to the
/// text-completion collaborator and hand its reply back verbatim.
pub async fn fallback_reply(
    llm: &dyn LlmProvider,
    clinic_name: &str,
    history: &[ChatLine],
    message: &str,
) -> anyhow::Result<String> {
    let mut messages: Vec<Message> = history
        .iter()
        .map(|line| Message {
            role: line.role.clone(),
            content: line.content.clone(),
        })
        .collect();
    messages.push(Message {
        role: "user".to_string(),
        content: message.to_string(),
    });

    llm.chat(&persona_prompt(clinic_name), &messages).await
}
