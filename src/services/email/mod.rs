pub mod resend;

use async_trait::async_trait;

/// Confirmation-mail collaborator. A failed send is reported to the user
/// but never rolls back a booking.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// The fixed confirmation template, as (subject, body).
pub fn confirmation_email(
    clinic_name: &str,
    patient: &str,
    doctor: &str,
    day: u32,
    month: u32,
    time: &str,
) -> (String, String) {
    let subject = format!("Appointment Confirmation - {clinic_name}");
    let body = format!(
        "Hi {patient},\n\n\
         Your appointment with {doctor} is confirmed for {day}/{month} at {time}.\n\n\
         Thank you for choosing {clinic_name}!\n"
    );
    (subject, body)
}
