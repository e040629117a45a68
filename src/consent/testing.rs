//! Shared fixtures for consent tests.

use serde_json::{json, Value};

use crate::db::SqliteRecordStore;
use crate::models::NewEncounter;

/// A submission body with every field filled and every item ticked.
pub(crate) fn complete_body() -> Value {
    json!({
        "token": "abc123",
        "staffName": "Nurse Jane",
        "patientChecklist": {
            "check1": true, "check2": true, "check3": true,
            "check4": true, "check5": true, "check6": true,
        },
        "staffChecklist": {
            "patient_information": true,
            "mental_preparation": true,
            "physical_preparation": true,
            "infection_prevention": true,
            "pain_management": true,
        },
        "note": "Patient asked about anaesthesia",
        "signatureImage": "<png-b64>",
    })
}

/// In-memory store holding one pending encounter `MR-0001` / `abc123`.
pub(crate) fn seeded_store() -> SqliteRecordStore {
    let store = SqliteRecordStore::open_in_memory().unwrap();
    seed(&store, "MR-0001", "abc123");
    store
}

pub(crate) fn seed(store: &SqliteRecordStore, mrn: &str, token: &str) {
    store
        .insert_encounter(&NewEncounter {
            medical_record_number: mrn.into(),
            identifier_token: Some(token.into()),
            patient_name: "Maria Pattiasina".into(),
            attending_physician: Some("dr. Ruben, Sp.B".into()),
            scheduled_procedure_at: chrono::NaiveDate::from_ymd_opt(2025, 4, 14)
                .and_then(|d| d.and_hms_opt(8, 0, 0)),
            fasting_start_at: chrono::NaiveDate::from_ymd_opt(2025, 4, 14)
                .and_then(|d| d.and_hms_opt(2, 0, 0)),
        })
        .unwrap();
}
