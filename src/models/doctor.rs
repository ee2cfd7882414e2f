use serde::{Deserialize, Serialize};

/// A clinic doctor as stored in the directory. Owned by the database;
/// the chat flow only ever works on copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub specialty: String,
}
