use serde::{Deserialize, Serialize};

/// How many conversation lines a session keeps for the LLM fallback.
pub const HISTORY_LIMIT: usize = 10;

/// Where a chat currently sits in the appointment-collection sequence.
///
/// The flow is linear; `BookingInit` and `SelectDoctor` are handled by the
/// same transition (both try to resolve a doctor from the message).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStage {
    Idle,
    BookingInit,
    SelectDoctor,
    SelectDay,
    SelectMonth,
    SelectTime,
    GetName,
    GetEmail,
}

impl BookingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStage::Idle => "idle",
            BookingStage::BookingInit => "booking_init",
            BookingStage::SelectDoctor => "select_doctor",
            BookingStage::SelectDay => "select_day",
            BookingStage::SelectMonth => "select_month",
            BookingStage::SelectTime => "select_time",
            BookingStage::GetName => "get_name",
            BookingStage::GetEmail => "get_email",
        }
    }
}

/// The appointment being assembled over the course of a booking flow.
/// Every field stays `None` until its stage fills it in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingDraft {
    pub doctor_id: Option<i64>,
    pub doctor_name: Option<String>,
    pub day: Option<u32>,
    pub month: Option<u32>,
    pub time: Option<String>,
    pub patient_name: Option<String>,
    pub patient_email: Option<String>,
}

impl BookingDraft {
    pub fn clear(&mut self) {
        *self = BookingDraft::default();
    }
}

/// One exchanged line of conversation, kept for fallback context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatLine {
    pub role: String,
    pub content: String,
}

/// Per-chat state. Lives in the in-memory session store for the whole
/// process lifetime; only an explicit "reset" clears the history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub chat_id: i64,
    pub stage: BookingStage,
    pub draft: BookingDraft,
    pub history: Vec<ChatLine>,
}

impl Session {
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            stage: BookingStage::Idle,
            draft: BookingDraft::default(),
            history: Vec::new(),
        }
    }

    /// Append a conversation line, dropping the oldest past HISTORY_LIMIT.
    pub fn remember(&mut self, role: &str, content: &str) {
        self.history.push(ChatLine {
            role: role.to_string(),
            content: content.to_string(),
        });
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_labels_are_snake_case() {
        assert_eq!(BookingStage::Idle.as_str(), "idle");
        assert_eq!(BookingStage::SelectDoctor.as_str(), "select_doctor");
        assert_eq!(BookingStage::GetEmail.as_str(), "get_email");
    }

    #[test]
    fn test_history_is_capped() {
        let mut session = Session::new(1);
        for i in 0..15 {
            session.remember("user", &format!("line {i}"));
        }
        assert_eq!(session.history.len(), HISTORY_LIMIT);
        assert_eq!(session.history[0].content, "line 5");
        assert_eq!(session.history.last().unwrap().content, "line 14");
    }
}
