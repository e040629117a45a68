use chrono::{DateTime, NaiveDateTime, Utc};

use super::checklist::{PatientConsentChecklist, StaffVerificationChecklist};
use super::enums::ApprovalStatus;

/// One patient encounter awaiting or holding surgical consent.
///
/// The approval fields live together in `consent`: either all of them are
/// present (Approved) or none are (Pending).
#[derive(Debug, Clone, PartialEq)]
pub struct Encounter {
    pub medical_record_number: String,
    pub identifier_token: String,
    pub patient_name: String,
    pub attending_physician: Option<String>,
    pub scheduled_procedure_at: Option<NaiveDateTime>,
    pub fasting_start_at: Option<NaiveDateTime>,
    pub created_at: DateTime<Utc>,
    pub consent: Option<ApprovedConsent>,
}

impl Encounter {
    pub fn approval_status(&self) -> ApprovalStatus {
        if self.consent.is_some() {
            ApprovalStatus::Approved
        } else {
            ApprovalStatus::Pending
        }
    }

    pub fn is_approved(&self) -> bool {
        self.consent.is_some()
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.consent.as_ref().map(|c| c.approved_at)
    }
}

/// Everything written by the single Pending → Approved transition.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovedConsent {
    pub approved_at: DateTime<Utc>,
    pub patient_checklist: PatientConsentChecklist,
    pub staff_checklist: StaffVerificationChecklist,
    pub staff_name: String,
    pub physician_note: Option<String>,
    pub signature_image: String,
}

/// Back-office input for seeding an encounter.
#[derive(Debug, Clone, Default)]
pub struct NewEncounter {
    pub medical_record_number: String,
    /// Generated when absent.
    pub identifier_token: Option<String>,
    pub patient_name: String,
    pub attending_physician: Option<String>,
    pub scheduled_procedure_at: Option<NaiveDateTime>,
    pub fasting_start_at: Option<NaiveDateTime>,
}
