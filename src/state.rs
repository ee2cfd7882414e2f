use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::ai::LlmProvider;
use crate::services::appointments::AppointmentRepo;
use crate::services::chat::ChatTransport;
use crate::services::directory::DoctorDirectory;
use crate::services::email::EmailProvider;
use crate::services::sessions::SessionStore;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub directory: Box<dyn DoctorDirectory>,
    pub appointments: Box<dyn AppointmentRepo>,
    pub llm: Box<dyn LlmProvider>,
    pub mailer: Box<dyn EmailProvider>,
    pub transport: Box<dyn ChatTransport>,
    pub sessions: SessionStore,
}
