pub mod appointment;
pub mod doctor;
pub mod session;

pub use appointment::{AppointmentDetail, NewAppointment};
pub use doctor::Doctor;
pub use session::{BookingDraft, BookingStage, ChatLine, Session, HISTORY_LIMIT};
