use serde::{Deserialize, Serialize};

/// Insert payload for a new appointment; the id is generated by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub patient_name: String,
    pub patient_email: String,
    pub doctor_id: i64,
    pub day: u32,
    pub month: u32,
    pub time: String,
}

/// Appointment joined with its doctor, for the read-only view API.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentDetail {
    pub id: i64,
    pub patient_name: String,
    pub patient_email: String,
    pub doctor_name: String,
    pub specialty: String,
    pub day: u32,
    pub month: u32,
    pub time: String,
}
