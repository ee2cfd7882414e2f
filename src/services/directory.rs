use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::db::queries;
use crate::models::Doctor;

/// Read-only access to the clinic's doctor list.
pub trait DoctorDirectory: Send + Sync {
    fn list(&self) -> anyhow::Result<Vec<Doctor>>;
}

pub struct SqliteDirectory {
    db: Arc<Mutex<Connection>>,
}

impl SqliteDirectory {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }
}

impl DoctorDirectory for SqliteDirectory {
    fn list(&self) -> anyhow::Result<Vec<Doctor>> {
        let db = self.db.lock().unwrap();
        queries::list_doctors(&db)
    }
}

/// Symptom keyword → specialty, scanned in this order. First entry whose
/// keyword appears in the message wins, regardless of where the keyword
/// sits in the user's text.
pub const SYMPTOM_SPECIALTIES: &[(&str, &str)] = &[
    ("fever", "general practitioner"),
    ("flu", "general practitioner"),
    ("cough", "general practitioner"),
    ("cold", "general practitioner"),
    ("heart", "cardiologist"),
    ("cardiac", "cardiologist"),
    ("chest pain", "cardiologist"),
];

/// Minimum token-overlap score for a fuzzy name match to count.
const MATCH_THRESHOLD: f64 = 0.4;

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Fuzzy-match free text ("Srivathsan?", "dr suresh please") against the
/// directory. Score is the share of input tokens that appear in the
/// candidate's name; the first candidate at the highest score wins, and
/// only scores above the threshold count as a match.
pub fn fuzzy_match_doctor(doctors: &[Doctor], input: &str) -> Option<(i64, String)> {
    let cleaned = normalize(input);
    let input_tokens: Vec<&str> = cleaned.split_whitespace().collect();

    let mut best_match: Option<(i64, String)> = None;
    let mut best_score = 0.0_f64;

    for doctor in doctors {
        let name_clean = normalize(&doctor.name);
        let name_tokens: Vec<&str> = name_clean.split_whitespace().collect();

        let matches = input_tokens
            .iter()
            .filter(|token| name_tokens.contains(token))
            .count();
        let score = matches as f64 / input_tokens.len().max(1) as f64;

        if score > best_score {
            best_score = score;
            best_match = Some((doctor.id, doctor.name.clone()));
        }
    }

    if best_score > MATCH_THRESHOLD {
        best_match
    } else {
        None
    }
}

/// Map a message to a specialty by symptom keyword, if any.
pub fn recommend_specialty(input: &str) -> Option<&'static str> {
    let lower = input.to_lowercase();
    SYMPTOM_SPECIALTIES
        .iter()
        .find(|(symptom, _)| lower.contains(symptom))
        .map(|(_, specialty)| *specialty)
}

/// First doctor whose specialty starts with the requested one,
/// case-insensitively ("general practitioner" → "General Practitioner").
pub fn doctor_by_specialty(doctors: &[Doctor], specialty: &str) -> Option<(i64, String)> {
    let wanted = specialty.to_lowercase();
    doctors
        .iter()
        .find(|d| d.specialty.to_lowercase().starts_with(&wanted))
        .map(|d| (d.id, d.name.clone()))
}

/// Symptom keyword → first doctor of the mapped specialty, when both
/// resolve.
pub fn doctor_for_symptoms(doctors: &[Doctor], message: &str) -> Option<(i64, String)> {
    recommend_specialty(message).and_then(|specialty| doctor_by_specialty(doctors, specialty))
}

/// Human-readable directory for chat replies.
pub fn format_doctor_list(doctors: &[Doctor]) -> String {
    if doctors.is_empty() {
        return "No doctors are available at the moment.".to_string();
    }
    doctors
        .iter()
        .map(|d| format!("- {} ({})", d.name, d.specialty))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doctors() -> Vec<Doctor> {
        vec![
            Doctor {
                id: 1,
                name: "Dr. Srivathsan".to_string(),
                specialty: "General Practitioner".to_string(),
            },
            Doctor {
                id: 2,
                name: "Dr. Suresh".to_string(),
                specialty: "Cardiologist".to_string(),
            },
        ]
    }

    #[test]
    fn test_exact_last_name_matches() {
        let doctors = sample_doctors();
        let matched = fuzzy_match_doctor(&doctors, "Srivathsan").unwrap();
        assert_eq!(matched, (1, "Dr. Srivathsan".to_string()));
    }

    #[test]
    fn test_punctuation_is_ignored() {
        let doctors = sample_doctors();
        let matched = fuzzy_match_doctor(&doctors, "Suresh!!").unwrap();
        assert_eq!(matched.0, 2);
    }

    #[test]
    fn test_no_match_for_unknown_name() {
        let doctors = sample_doctors();
        assert!(fuzzy_match_doctor(&doctors, "xyz").is_none());
    }

    #[test]
    fn test_score_must_exceed_threshold() {
        let doctors = sample_doctors();
        // 1 matching token out of 2 → 0.5, above threshold.
        assert!(fuzzy_match_doctor(&doctors, "dr suresh").is_some());
        // 2 matching tokens out of 5 → exactly 0.4, not strictly above.
        assert!(fuzzy_match_doctor(&doctors, "dr suresh and two others").is_none());
    }

    #[test]
    fn test_first_best_candidate_wins_ties() {
        let doctors = vec![
            Doctor {
                id: 1,
                name: "Dr. Kumar".to_string(),
                specialty: "General Practitioner".to_string(),
            },
            Doctor {
                id: 2,
                name: "Dr. Kumar".to_string(),
                specialty: "Cardiologist".to_string(),
            },
        ];
        let matched = fuzzy_match_doctor(&doctors, "Kumar").unwrap();
        assert_eq!(matched.0, 1);
    }

    #[test]
    fn test_empty_input_never_matches() {
        let doctors = sample_doctors();
        assert!(fuzzy_match_doctor(&doctors, "   ").is_none());
    }

    #[test]
    fn test_symptom_maps_to_specialty() {
        assert_eq!(
            recommend_specialty("I have a fever"),
            Some("general practitioner")
        );
        assert_eq!(
            recommend_specialty("my HEART keeps racing"),
            Some("cardiologist")
        );
        assert_eq!(recommend_specialty("I feel great"), None);
    }

    #[test]
    fn test_symptom_table_order_wins_over_input_order() {
        // "heart" appears first in the message, but "cold" comes first in
        // the table scan.
        assert_eq!(
            recommend_specialty("my heart aches and I caught a cold"),
            Some("general practitioner")
        );
    }

    #[test]
    fn test_doctor_for_symptoms_needs_both_mappings() {
        let doctors = sample_doctors();
        assert_eq!(
            doctor_for_symptoms(&doctors, "I have a fever"),
            Some((1, "Dr. Srivathsan".to_string()))
        );
        assert_eq!(doctor_for_symptoms(&doctors, "feeling fine"), None);

        // Specialty resolves but nobody practices it.
        let cardio_only = vec![Doctor {
            id: 9,
            name: "Dr. Suresh".to_string(),
            specialty: "Cardiologist".to_string(),
        }];
        assert_eq!(doctor_for_symptoms(&cardio_only, "I have a fever"), None);
    }

    #[test]
    fn test_doctor_by_specialty_prefix_case_insensitive() {
        let doctors = sample_doctors();
        assert_eq!(
            doctor_by_specialty(&doctors, "general practitioner"),
            Some((1, "Dr. Srivathsan".to_string()))
        );
        assert_eq!(
            doctor_by_specialty(&doctors, "cardio"),
            Some((2, "Dr. Suresh".to_string()))
        );
        assert_eq!(doctor_by_specialty(&doctors, "dermatologist"), None);
    }

    #[test]
    fn test_format_doctor_list() {
        let doctors = sample_doctors();
        let listing = format_doctor_list(&doctors);
        assert_eq!(
            listing,
            "- Dr. Srivathsan (General Practitioner)\n- Dr. Suresh (Cardiologist)"
        );
        assert_eq!(
            format_doctor_list(&[]),
            "No doctors are available at the moment."
        );
    }
}
