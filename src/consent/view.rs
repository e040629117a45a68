//! View Reconstructor.
//!
//! Pending encounters produce an empty form that asks for the staff name.
//! Approved encounters reproduce the stored checklists, names, note and
//! signature exactly as persisted; nothing is recomputed or re-validated.
//! Only display strings are derived here.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::models::{
    ApprovalStatus, Encounter, PatientConsentChecklist, StaffVerificationChecklist,
};

const PROCEDURE_DATE_FORMAT: &str = "%A, %d %B %Y";
const TIME_FORMAT: &str = "%H:%M";
const APPROVED_AT_FORMAT: &str = "%d %B %Y %H:%M UTC";

const PROCEDURE_DATE_PENDING: &str = "To be scheduled";
const PROCEDURE_TIME_PENDING: &str = "Awaiting confirmation";
const FASTING_DEFAULT: &str = "6 hours before surgery";
const PHYSICIAN_PENDING: &str = "To be determined";

/// `GET /api/encounters/:identifier` body. The access token is never part
/// of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentView {
    pub medical_record_number: String,
    pub patient_name: String,
    pub status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub schedule: ScheduleView,
    pub form: ConsentForm,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleView {
    pub attending_physician: Option<String>,
    pub scheduled_procedure_at: Option<NaiveDateTime>,
    pub fasting_start_at: Option<NaiveDateTime>,
    pub attending_physician_display: String,
    pub procedure_date_display: String,
    pub procedure_time_display: String,
    pub fasting_start_display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ConsentForm {
    Bootstrap(BootstrapForm),
    ReadOnly(ReadOnlyForm),
}

/// Unfilled form for a pending encounter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapForm {
    pub patient_checklist: PatientConsentChecklist,
    pub staff_checklist: StaffVerificationChecklist,
    pub requires_staff_name: bool,
    pub editable: bool,
}

/// Persisted approval, rendered non-editable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadOnlyForm {
    pub patient_checklist: PatientConsentChecklist,
    pub staff_checklist: StaffVerificationChecklist,
    pub staff_name: String,
    #[serde(rename = "note")]
    pub physician_note: Option<String>,
    pub signature_image: String,
    pub approved_at: DateTime<Utc>,
    pub approved_at_display: String,
    pub editable: bool,
}

pub fn reconstruct(encounter: &Encounter) -> ConsentView {
    let form = match &encounter.consent {
        None => ConsentForm::Bootstrap(BootstrapForm {
            patient_checklist: PatientConsentChecklist::default(),
            staff_checklist: StaffVerificationChecklist::default(),
            requires_staff_name: true,
            editable: true,
        }),
        Some(consent) => ConsentForm::ReadOnly(ReadOnlyForm {
            patient_checklist: consent.patient_checklist,
            staff_checklist: consent.staff_checklist,
            staff_name: consent.staff_name.clone(),
            physician_note: consent.physician_note.clone(),
            signature_image: consent.signature_image.clone(),
            approved_at: consent.approved_at,
            approved_at_display: consent.approved_at.format(APPROVED_AT_FORMAT).to_string(),
            editable: false,
        }),
    };

    ConsentView {
        medical_record_number: encounter.medical_record_number.clone(),
        patient_name: encounter.patient_name.clone(),
        status: encounter.approval_status(),
        created_at: encounter.created_at,
        schedule: schedule_view(encounter),
        form,
    }
}

fn schedule_view(encounter: &Encounter) -> ScheduleView {
    let procedure = encounter.scheduled_procedure_at;
    ScheduleView {
        attending_physician: encounter.attending_physician.clone(),
        scheduled_procedure_at: procedure,
        fasting_start_at: encounter.fasting_start_at,
        attending_physician_display: encounter
            .attending_physician
            .clone()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| PHYSICIAN_PENDING.to_string()),
        procedure_date_display: display_or(procedure, PROCEDURE_DATE_FORMAT, PROCEDURE_DATE_PENDING),
        procedure_time_display: display_or(procedure, TIME_FORMAT, PROCEDURE_TIME_PENDING),
        fasting_start_display: display_or(encounter.fasting_start_at, TIME_FORMAT, FASTING_DEFAULT),
    }
}

fn display_or(value: Option<NaiveDateTime>, format: &str, fallback: &str) -> String {
    value
        .map(|dt| dt.format(format).to_string())
        .unwrap_or_else(|| fallback.to_string())
}
