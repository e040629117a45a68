use std::str::FromStr;

use base64::Engine;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ENCOUNTER_COLUMNS: &str = "medical_record_number, identifier_token, patient_name,
     attending_physician, scheduled_procedure_at, fasting_start_at, approval_status,
     approved_at, patient_consent_checklist, staff_verification_checklist, staff_name,
     physician_note, signature_image, created_at";

/// Generate an opaque access token (URL-safe base64, 32 bytes of entropy).
pub fn generate_access_token() -> String {
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

pub fn insert_encounter(
    conn: &Connection,
    encounter: &NewEncounter,
    identifier_token: &str,
    created_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO encounters (medical_record_number, identifier_token, patient_name,
         attending_physician, scheduled_procedure_at, fasting_start_at, approval_status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            encounter.medical_record_number,
            identifier_token,
            encounter.patient_name,
            encounter.attending_physician,
            encounter.scheduled_procedure_at.map(format_naive),
            encounter.fasting_start_at.map(format_naive),
            ApprovalStatus::Pending.as_str(),
            format_utc(created_at),
        ],
    )
    .map_err(map_constraint)?;
    Ok(())
}

pub fn get_encounter_by_token(
    conn: &Connection,
    identifier_token: &str,
) -> Result<Option<Encounter>, DatabaseError> {
    let sql = format!("SELECT {ENCOUNTER_COLUMNS} FROM encounters WHERE identifier_token = ?1");
    let raw = conn
        .query_row(&sql, params![identifier_token], read_row)
        .optional()?;
    raw.map(Encounter::try_from).transpose()
}

pub fn get_encounter_by_medical_record_number(
    conn: &Connection,
    medical_record_number: &str,
) -> Result<Option<Encounter>, DatabaseError> {
    let sql =
        format!("SELECT {ENCOUNTER_COLUMNS} FROM encounters WHERE medical_record_number = ?1");
    let raw = conn
        .query_row(&sql, params![medical_record_number], read_row)
        .optional()?;
    raw.map(Encounter::try_from).transpose()
}

/// Write the approval fields, guarded on the row still being pending.
/// Returns the number of rows changed (0 or 1).
pub fn approve_encounter(
    conn: &Connection,
    medical_record_number: &str,
    consent: &ApprovedConsent,
) -> Result<usize, DatabaseError> {
    let patient_checklist = serde_json::to_string(&consent.patient_checklist)?;
    let staff_checklist = serde_json::to_string(&consent.staff_checklist)?;

    let changed = conn.execute(
        "UPDATE encounters SET
             approval_status = ?1,
             approved_at = ?2,
             patient_consent_checklist = ?3,
             staff_verification_checklist = ?4,
             staff_name = ?5,
             physician_note = ?6,
             signature_image = ?7
         WHERE medical_record_number = ?8 AND approval_status = ?9",
        params![
            ApprovalStatus::Approved.as_str(),
            format_utc(consent.approved_at),
            patient_checklist,
            staff_checklist,
            consent.staff_name,
            consent.physician_note,
            consent.signature_image,
            medical_record_number,
            ApprovalStatus::Pending.as_str(),
        ],
    )?;
    Ok(changed)
}

// ─── Row mapping ──────────────────────────────────────────────────────────────

/// Column values as stored, before type checks.
struct EncounterRow {
    medical_record_number: String,
    identifier_token: String,
    patient_name: String,
    attending_physician: Option<String>,
    scheduled_procedure_at: Option<String>,
    fasting_start_at: Option<String>,
    approval_status: String,
    approved_at: Option<String>,
    patient_consent_checklist: Option<String>,
    staff_verification_checklist: Option<String>,
    staff_name: Option<String>,
    physician_note: Option<String>,
    signature_image: Option<String>,
    created_at: String,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<EncounterRow> {
    Ok(EncounterRow {
        medical_record_number: row.get(0)?,
        identifier_token: row.get(1)?,
        patient_name: row.get(2)?,
        attending_physician: row.get(3)?,
        scheduled_procedure_at: row.get(4)?,
        fasting_start_at: row.get(5)?,
        approval_status: row.get(6)?,
        approved_at: row.get(7)?,
        patient_consent_checklist: row.get(8)?,
        staff_verification_checklist: row.get(9)?,
        staff_name: row.get(10)?,
        physician_note: row.get(11)?,
        signature_image: row.get(12)?,
        created_at: row.get(13)?,
    })
}

impl TryFrom<EncounterRow> for Encounter {
    type Error = DatabaseError;

    fn try_from(row: EncounterRow) -> Result<Self, Self::Error> {
        let mrn = row.medical_record_number.clone();
        let corrupt = |reason: String| DatabaseError::CorruptRecord {
            medical_record_number: mrn.clone(),
            reason,
        };

        let status = ApprovalStatus::from_str(&row.approval_status)?;

        let consent = match status {
            ApprovalStatus::Pending => None,
            ApprovalStatus::Approved => {
                let approved_at = row
                    .approved_at
                    .as_deref()
                    .ok_or_else(|| corrupt("approved without approved_at".into()))
                    .and_then(|s| parse_utc(s).map_err(corrupt))?;
                let patient_raw = row
                    .patient_consent_checklist
                    .ok_or_else(|| corrupt("approved without patient checklist".into()))?;
                let staff_raw = row
                    .staff_verification_checklist
                    .ok_or_else(|| corrupt("approved without staff checklist".into()))?;
                Some(ApprovedConsent {
                    approved_at,
                    patient_checklist: serde_json::from_str(&patient_raw)
                        .map_err(|e| corrupt(format!("patient checklist: {e}")))?,
                    staff_checklist: serde_json::from_str(&staff_raw)
                        .map_err(|e| corrupt(format!("staff checklist: {e}")))?,
                    staff_name: row
                        .staff_name
                        .ok_or_else(|| corrupt("approved without staff name".into()))?,
                    physician_note: row.physician_note,
                    signature_image: row
                        .signature_image
                        .ok_or_else(|| corrupt("approved without signature".into()))?,
                })
            }
        };

        Ok(Encounter {
            scheduled_procedure_at: row
                .scheduled_procedure_at
                .as_deref()
                .map(parse_naive)
                .transpose()
                .map_err(corrupt)?,
            fasting_start_at: row
                .fasting_start_at
                .as_deref()
                .map(parse_naive)
                .transpose()
                .map_err(corrupt)?,
            created_at: parse_utc(&row.created_at).map_err(corrupt)?,
            medical_record_number: row.medical_record_number,
            identifier_token: row.identifier_token,
            patient_name: row.patient_name,
            attending_physician: row.attending_physician,
            consent,
        })
    }
}

fn format_naive(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

fn parse_naive(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).map_err(|e| format!("datetime {s:?}: {e}"))
}

fn format_utc(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_utc(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("timestamp {s:?}: {e}"))
}

fn map_constraint(err: rusqlite::Error) -> DatabaseError {
    match &err {
        rusqlite::Error::SqliteFailure(e, msg) if e.code == ErrorCode::ConstraintViolation => {
            DatabaseError::ConstraintViolation(
                msg.clone().unwrap_or_else(|| "constraint violation".into()),
            )
        }
        _ => DatabaseError::Sqlite(err),
    }
}
