use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::Session;

/// In-memory, process-lifetime store of per-chat sessions.
///
/// Locking discipline: the map mutex covers individual get/save/reset
/// calls only and is never held across I/O. A handler clones the session
/// out, works on the clone, and writes it back with `save`, so the store
/// relies on the chat transport delivering at most one message per chat
/// at a time. Two concurrent messages for the same chat would race on the
/// write-back, the same exposure the source system has.
pub struct SessionStore {
    sessions: Mutex<HashMap<i64, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the session for a chat, creating a fresh idle one on first
    /// contact. The get-or-create is atomic under the map lock.
    pub fn get_or_create(&self, chat_id: i64) -> Session {
        let mut sessions = self.sessions.lock().unwrap();
        sessions
            .entry(chat_id)
            .or_insert_with(|| Session::new(chat_id))
            .clone()
    }

    /// Write a processed session back.
    pub fn save(&self, session: Session) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(session.chat_id, session);
    }

    /// Drop everything known about a chat, returning it to a fresh idle
    /// session. Used by the unconditional "reset" command.
    pub fn reset(&self, chat_id: i64) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(chat_id, Session::new(chat_id));
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingStage;

    #[test]
    fn test_get_or_create_is_stable() {
        let store = SessionStore::new();
        let first = store.get_or_create(42);
        assert_eq!(first.stage, BookingStage::Idle);

        let mut session = store.get_or_create(42);
        session.stage = BookingStage::SelectDay;
        store.save(session);

        let reloaded = store.get_or_create(42);
        assert_eq!(reloaded.stage, BookingStage::SelectDay);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let store = SessionStore::new();
        let mut session = store.get_or_create(7);
        session.stage = BookingStage::GetEmail;
        session.draft.patient_name = Some("John Doe".to_string());
        session.remember("user", "hello");
        store.save(session);

        store.reset(7);

        let fresh = store.get_or_create(7);
        assert_eq!(fresh.stage, BookingStage::Idle);
        assert!(fresh.draft.patient_name.is_none());
        assert!(fresh.history.is_empty());
    }

    #[test]
    fn test_chats_are_independent() {
        let store = SessionStore::new();
        let mut a = store.get_or_create(1);
        a.stage = BookingStage::SelectTime;
        store.save(a);

        let b = store.get_or_create(2);
        assert_eq!(b.stage, BookingStage::Idle);
    }
}
