use chrono::Utc;
use rusqlite::{params, Connection};

use crate::models::{AppointmentDetail, Doctor, NewAppointment};

// ── Doctors ──

pub fn list_doctors(conn: &Connection) -> anyhow::Result<Vec<Doctor>> {
    let mut stmt = conn.prepare("SELECT id, name, specialty FROM doctors ORDER BY id ASC")?;

    let rows = stmt.query_map([], |row| {
        Ok(Doctor {
            id: row.get(0)?,
            name: row.get(1)?,
            specialty: row.get(2)?,
        })
    })?;

    let mut doctors = vec![];
    for row in rows {
        doctors.push(row?);
    }
    Ok(doctors)
}

pub fn insert_doctor(conn: &Connection, name: &str, specialty: &str) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO doctors (name, specialty) VALUES (?1, ?2)",
        params![name, specialty],
    )?;
    Ok(conn.last_insert_rowid())
}

// ── Appointments ──

/// Number of appointments already occupying the (doctor, day, month, time)
/// slot. Zero means free.
pub fn count_slot(
    conn: &Connection,
    doctor_id: i64,
    day: u32,
    month: u32,
    time: &str,
) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM appointments
         WHERE doctor_id = ?1 AND day = ?2 AND month = ?3 AND time = ?4",
        params![doctor_id, day, month, time],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn insert_appointment(conn: &Connection, appt: &NewAppointment) -> anyhow::Result<i64> {
    let created_at = Utc::now()
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    conn.execute(
        "INSERT INTO appointments (patient_name, patient_email, doctor_id, day, month, time, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            appt.patient_name,
            appt.patient_email,
            appt.doctor_id,
            appt.day,
            appt.month,
            appt.time,
            created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// One appointment joined with its doctor, `None` when the id is unknown.
pub fn get_appointment(conn: &Connection, id: i64) -> anyhow::Result<Option<AppointmentDetail>> {
    let result = conn.query_row(
        "SELECT a.id, a.patient_name, a.patient_email, d.name, d.specialty, a.day, a.month, a.time
         FROM appointments a
         JOIN doctors d ON a.doctor_id = d.id
         WHERE a.id = ?1",
        params![id],
        |row| {
            Ok(AppointmentDetail {
                id: row.get(0)?,
                patient_name: row.get(1)?,
                patient_email: row.get(2)?,
                doctor_name: row.get(3)?,
                specialty: row.get(4)?,
                day: row.get(5)?,
                month: row.get(6)?,
                time: row.get(7)?,
            })
        },
    );

    match result {
        Ok(appt) => Ok(Some(appt)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Appointments joined with their doctor, ordered the way the front desk
/// reads the book: by day, then time.
pub fn list_appointments(conn: &Connection) -> anyhow::Result<Vec<AppointmentDetail>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.patient_name, a.patient_email, d.name, d.specialty, a.day, a.month, a.time
         FROM appointments a
         JOIN doctors d ON a.doctor_id = d.id
         ORDER BY a.day ASC, a.time ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(AppointmentDetail {
            id: row.get(0)?,
            patient_name: row.get(1)?,
            patient_email: row.get(2)?,
            doctor_name: row.get(3)?,
            specialty: row.get(4)?,
            day: row.get(5)?,
            month: row.get(6)?,
            time: row.get(7)?,
        })
    })?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row?);
    }
    Ok(appointments)
}
