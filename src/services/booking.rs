use std::sync::LazyLock;

use anyhow::Context;
use regex::Regex;

use crate::models::{BookingStage, NewAppointment, Session};
use crate::services::appointments::AppointmentRepo;
use crate::services::directory::{self, DoctorDirectory};
use crate::services::email::{confirmation_email, EmailProvider};

/// Words that pull an idle chat into the booking flow.
pub const BOOKING_KEYWORDS: &[&str] = &["book", "appointment", "consultation", "schedule"];

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}$").unwrap());
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^@]+@[^@]+\.[^@]+$").unwrap());

pub fn wants_booking(message: &str) -> bool {
    let lower = message.to_lowercase();
    BOOKING_KEYWORDS.iter().any(|word| lower.contains(word))
}

/// The booking state machine and its collaborators. Each `advance` call
/// takes the latest message, mutates the session in place and returns the
/// single reply for it. Side effects happen at exactly two points: the
/// availability check at select_time, and persist + email at get_email.
///
/// Store failures propagate as errors so the caller can answer with a
/// retry message without writing the session back.
pub struct BookingEngine<'a> {
    pub directory: &'a dyn DoctorDirectory,
    pub appointments: &'a dyn AppointmentRepo,
    pub mailer: &'a dyn EmailProvider,
    pub clinic_name: &'a str,
}

impl BookingEngine<'_> {
    pub async fn advance(&self, session: &mut Session, message: &str) -> anyhow::Result<String> {
        match session.stage {
            // Only reached on booking intent; the router keeps other idle
            // messages out of the machine.
            BookingStage::Idle => {
                let doctors = self.directory.list()?;
                session.stage = BookingStage::BookingInit;

                // A mentioned symptom can pick the doctor outright and
                // skip doctor selection.
                if let Some((id, name)) = directory::doctor_for_symptoms(&doctors, message) {
                    session.draft.doctor_id = Some(id);
                    session.draft.doctor_name = Some(name.clone());
                    session.stage = BookingStage::SelectDay;
                    return Ok(format!(
                        "I'm so sorry you're not feeling well. Based on your symptoms, I'd \
                         recommend seeing {name}. Let's get you scheduled! Which day of this \
                         month would work for you (1-31)?"
                    ));
                }

                Ok(format!(
                    "Sure, let's book an appointment! Here are our available doctors:\n{}\n\n\
                     Who would you like to consult with? Or let me know if you have symptoms \
                     so I can recommend someone.",
                    directory::format_doctor_list(&doctors)
                ))
            }

            // Both stages resolve a doctor the same way: name first, then
            // symptoms.
            BookingStage::BookingInit | BookingStage::SelectDoctor => {
                let doctors = self.directory.list()?;

                if let Some((id, name)) = directory::fuzzy_match_doctor(&doctors, message) {
                    session.draft.doctor_id = Some(id);
                    session.draft.doctor_name = Some(name.clone());
                    session.stage = BookingStage::SelectDay;
                    return Ok(format!(
                        "Great choice! I've got you down for {name}. Which day of this month \
                         works for you (1-31)?"
                    ));
                }

                if let Some((id, name)) = directory::doctor_for_symptoms(&doctors, message) {
                    session.draft.doctor_id = Some(id);
                    session.draft.doctor_name = Some(name.clone());
                    session.stage = BookingStage::SelectDay;
                    return Ok(format!(
                        "I'm so sorry to hear that you're not well. For those symptoms, {name} \
                         would be a good fit. What day of the month suits you?"
                    ));
                }

                session.stage = BookingStage::SelectDoctor;
                Ok(format!(
                    "I'm not entirely sure which doctor you want. Could you clarify? Here's a \
                     quick reminder of who's available:\n{}\n\nKindly mention just their name.",
                    directory::format_doctor_list(&doctors)
                ))
            }

            BookingStage::SelectDay => Ok(match message.trim().parse::<u32>() {
                Ok(day) if (1..=31).contains(&day) => {
                    session.draft.day = Some(day);
                    session.stage = BookingStage::SelectMonth;
                    "Great! Which month number would you prefer? (1-12)".to_string()
                }
                _ => "Hmm, that doesn't seem like a valid day (1-31). Could you try again?"
                    .to_string(),
            }),

            BookingStage::SelectMonth => Ok(match message.trim().parse::<u32>() {
                Ok(month) if (1..=12).contains(&month) => {
                    session.draft.month = Some(month);
                    session.stage = BookingStage::SelectTime;
                    "Fantastic. What time slot do you prefer? (Format: HH:MM:SS, e.g. 09:30:00)"
                        .to_string()
                }
                _ => "That doesn't seem like a valid month (1-12). Could you try again?"
                    .to_string(),
            }),

            BookingStage::SelectTime => {
                let time = message.trim();
                if !TIME_RE.is_match(time) {
                    return Ok(
                        "Time must be in HH:MM:SS format (e.g., 14:30:00). Could you try again?"
                            .to_string(),
                    );
                }
                session.draft.time = Some(time.to_string());

                let doctor_id = session.draft.doctor_id.context("no doctor on the draft")?;
                let day = session.draft.day.context("no day on the draft")?;
                let month = session.draft.month.context("no month on the draft")?;

                if self.appointments.slot_taken(doctor_id, day, month, time)? {
                    return Ok("I'm sorry, that time slot's already taken. Could you give me \
                               another time in HH:MM:SS?"
                        .to_string());
                }

                session.stage = BookingStage::GetName;
                Ok("That slot is free! Could I get your name?".to_string())
            }

            BookingStage::GetName => {
                let name = message.trim().to_string();
                let reply = format!(
                    "Thanks, {name}! Finally, could I get your email address so I can send \
                     you a confirmation?"
                );
                session.draft.patient_name = Some(name);
                session.stage = BookingStage::GetEmail;
                Ok(reply)
            }

            BookingStage::GetEmail => {
                let email = message.trim();
                if !EMAIL_RE.is_match(email) {
                    return Ok(
                        "That doesn't look like a valid email. Could you try typing it again?"
                            .to_string(),
                    );
                }
                session.draft.patient_email = Some(email.to_string());

                let appt = NewAppointment {
                    patient_name: session
                        .draft
                        .patient_name
                        .clone()
                        .context("no name on the draft")?,
                    patient_email: email.to_string(),
                    doctor_id: session.draft.doctor_id.context("no doctor on the draft")?,
                    day: session.draft.day.context("no day on the draft")?,
                    month: session.draft.month.context("no month on the draft")?,
                    time: session.draft.time.clone().context("no time on the draft")?,
                };
                let doctor_name = session
                    .draft
                    .doctor_name
                    .clone()
                    .context("no doctor on the draft")?;

                // A failed insert propagates before the reset below, so the
                // chat stays in get_email and the user can retry.
                let appointment_id = self.appointments.create(&appt)?;
                tracing::info!(chat_id = session.chat_id, appointment_id, "appointment booked");

                let (subject, body) = confirmation_email(
                    self.clinic_name,
                    &appt.patient_name,
                    &doctor_name,
                    appt.day,
                    appt.month,
                    &appt.time,
                );
                let emailed = self.mailer.send(&appt.patient_email, &subject, &body).await;

                session.stage = BookingStage::Idle;
                session.draft.clear();

                Ok(match emailed {
                    Ok(()) => "Awesome news: your appointment is confirmed! I've just sent you \
                               a confirmation email. Hope you feel better soon!"
                        .to_string(),
                    Err(e) => {
                        tracing::error!(
                            chat_id = session.chat_id,
                            error = %e,
                            "confirmation email failed"
                        );
                        "Awesome news: your appointment is confirmed! I couldn't send the \
                         confirmation email though. Sorry about that!"
                            .to_string()
                    }
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::db::{self, queries};
    use crate::services::appointments::SqliteAppointments;
    use crate::services::directory::SqliteDirectory;

    struct NullMailer;

    #[async_trait]
    impl EmailProvider for NullMailer {
        async fn send(&self, _to: &str, _subject: &str, _body: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct Fixture {
        directory: SqliteDirectory,
        appointments: SqliteAppointments,
    }

    fn fixture() -> Fixture {
        let conn = db::init_db(":memory:").unwrap();
        queries::insert_doctor(&conn, "Dr. Srivathsan", "General Practitioner").unwrap();
        queries::insert_doctor(&conn, "Dr. Suresh", "Cardiologist").unwrap();
        let db = Arc::new(Mutex::new(conn));
        Fixture {
            directory: SqliteDirectory::new(Arc::clone(&db)),
            appointments: SqliteAppointments::new(db),
        }
    }

    fn engine(fx: &Fixture) -> BookingEngine<'_> {
        BookingEngine {
            directory: &fx.directory,
            appointments: &fx.appointments,
            mailer: &NullMailer,
            clinic_name: "Srivathsan Healthcare",
        }
    }

    #[test]
    fn test_booking_keywords() {
        assert!(wants_booking("I want to BOOK a visit"));
        assert!(wants_booking("appointment please"));
        assert!(wants_booking("can we schedule something?"));
        assert!(wants_booking("a consultation would help"));
        assert!(!wants_booking("my knee hurts"));
    }

    #[tokio::test]
    async fn test_day_and_month_are_range_checked() {
        let fx = fixture();
        let engine = engine(&fx);
        let mut session = Session::new(1);

        engine.advance(&mut session, "appointment").await.unwrap();
        engine.advance(&mut session, "Srivathsan").await.unwrap();
        assert_eq!(session.stage, BookingStage::SelectDay);

        for bad in ["0", "32", "tomorrow"] {
            let reply = engine.advance(&mut session, bad).await.unwrap();
            assert!(reply.contains("1-31"), "unexpected reply for {bad}: {reply}");
            assert_eq!(session.stage, BookingStage::SelectDay);
        }

        engine.advance(&mut session, "18").await.unwrap();
        assert_eq!(session.stage, BookingStage::SelectMonth);
        assert_eq!(session.draft.day, Some(18));

        for bad in ["0", "13", "April"] {
            let reply = engine.advance(&mut session, bad).await.unwrap();
            assert!(reply.contains("1-12"), "unexpected reply for {bad}: {reply}");
            assert_eq!(session.stage, BookingStage::SelectMonth);
        }

        engine.advance(&mut session, "4").await.unwrap();
        assert_eq!(session.stage, BookingStage::SelectTime);
        assert_eq!(session.draft.month, Some(4));
    }

    #[tokio::test]
    async fn test_time_format_is_strict() {
        let fx = fixture();
        let engine = engine(&fx);
        let mut session = Session::new(1);
        for msg in ["appointment", "Srivathsan", "18", "4"] {
            engine.advance(&mut session, msg).await.unwrap();
        }

        for bad in ["9:30", "10:00", "ten", "10:00:00pm"] {
            let reply = engine.advance(&mut session, bad).await.unwrap();
            assert!(
                reply.contains("HH:MM:SS format"),
                "unexpected reply for {bad}: {reply}"
            );
            assert_eq!(session.stage, BookingStage::SelectTime);
        }

        let reply = engine.advance(&mut session, "09:30:00").await.unwrap();
        assert!(reply.contains("free"));
        assert_eq!(session.stage, BookingStage::GetName);
    }

    #[tokio::test]
    async fn test_email_validated_then_booking_completes() {
        let fx = fixture();
        let engine = engine(&fx);
        let mut session = Session::new(1);
        for msg in ["appointment", "Srivathsan", "18", "4", "10:00:00", "John Doe"] {
            engine.advance(&mut session, msg).await.unwrap();
        }
        assert_eq!(session.stage, BookingStage::GetEmail);

        for bad in ["not-an-email", "john@example", "a@b@c.com"] {
            let reply = engine.advance(&mut session, bad).await.unwrap();
            assert!(
                reply.contains("valid email"),
                "unexpected reply for {bad}: {reply}"
            );
            assert_eq!(session.stage, BookingStage::GetEmail);
        }

        let reply = engine
            .advance(&mut session, "john@example.com")
            .await
            .unwrap();
        assert!(reply.contains("confirmed"));
        assert_eq!(session.stage, BookingStage::Idle);
        assert!(session.draft.doctor_id.is_none());
        assert!(session.draft.patient_name.is_none());
        assert!(fx.appointments.slot_taken(1, 18, 4, "10:00:00").unwrap());
    }

    #[tokio::test]
    async fn test_symptom_entry_skips_doctor_selection() {
        let fx = fixture();
        let engine = engine(&fx);
        let mut session = Session::new(1);

        let reply = engine
            .advance(&mut session, "I'd like an appointment, I have a fever")
            .await
            .unwrap();
        assert!(reply.contains("Dr. Srivathsan"));
        assert_eq!(session.stage, BookingStage::SelectDay);
        assert_eq!(session.draft.doctor_id, Some(1));
    }

    #[tokio::test]
    async fn test_taken_slot_asks_for_another_time() {
        let fx = fixture();
        fx.appointments
            .create(&NewAppointment {
                patient_name: "Priya Sharma".to_string(),
                patient_email: "priya@example.com".to_string(),
                doctor_id: 1,
                day: 18,
                month: 4,
                time: "10:00:00".to_string(),
            })
            .unwrap();

        let engine = engine(&fx);
        let mut session = Session::new(2);
        for msg in ["appointment", "Srivathsan", "18", "4"] {
            engine.advance(&mut session, msg).await.unwrap();
        }

        let reply = engine.advance(&mut session, "10:00:00").await.unwrap();
        assert!(reply.contains("already taken"));
        assert_eq!(session.stage, BookingStage::SelectTime);

        let reply = engine.advance(&mut session, "11:00:00").await.unwrap();
        assert!(reply.contains("free"));
        assert_eq!(session.stage, BookingStage::GetName);
    }
}
