use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::db::queries;
use crate::models::NewAppointment;

/// Appointment persistence as seen by the booking flow.
///
/// `slot_taken` and `create` are deliberately separate, non-transactional
/// calls, matching the system this replaces: two bookings racing for the
/// same slot can both see it free before either inserts. Known risk,
/// carried over rather than papered over.
pub trait AppointmentRepo: Send + Sync {
    fn slot_taken(&self, doctor_id: i64, day: u32, month: u32, time: &str)
        -> anyhow::Result<bool>;

    /// Insert the appointment and return its generated id.
    fn create(&self, appt: &NewAppointment) -> anyhow::Result<i64>;
}

pub struct SqliteAppointments {
    db: Arc<Mutex<Connection>>,
}

impl SqliteAppointments {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }
}

impl AppointmentRepo for SqliteAppointments {
    fn slot_taken(
        &self,
        doctor_id: i64,
        day: u32,
        month: u32,
        time: &str,
    ) -> anyhow::Result<bool> {
        let db = self.db.lock().unwrap();
        let count = queries::count_slot(&db, doctor_id, day, month, time)?;
        Ok(count > 0)
    }

    fn create(&self, appt: &NewAppointment) -> anyhow::Result<i64> {
        let db = self.db.lock().unwrap();
        queries::insert_appointment(&db, appt)
    }
}
