pub mod ai;
pub mod appointments;
pub mod booking;
pub mod chat;
pub mod conversation;
pub mod directory;
pub mod email;
pub mod sessions;
