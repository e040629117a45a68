//! Consent Aggregate: validation of a submission before any write.
//!
//! The booklet client sends loosely-typed JSON. Only the fields below are
//! read; anything else in the body is dropped at deserialization and never
//! reaches a column. Every field is taken as raw JSON so a wrongly-typed
//! value never rejects the body before the encounter is resolved; type
//! problems surface here as `ValidationIssue`s. Checklists are read through
//! `ChecklistParse`, so a non-boolean item becomes `false` and blocks
//! approval.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::models::{
    ApprovedConsent, ChecklistParse, PatientConsentChecklist, StaffVerificationChecklist,
};

use super::resolver::IdentifierLookup;

/// `POST /api/submit` body. JSON `null` reads as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub token: Option<Value>,
    pub medical_record_number: Option<Value>,
    pub staff_name: Option<Value>,
    pub patient_checklist: Option<Value>,
    pub staff_checklist: Option<Value>,
    #[serde(rename = "note")]
    pub physician_note: Option<Value>,
    pub signature_image: Option<Value>,
}

impl SubmissionPayload {
    /// Identifiers that are not strings are ignored for lookup.
    pub fn identifier(&self) -> Option<IdentifierLookup> {
        IdentifierLookup::new(
            self.token.as_ref().and_then(Value::as_str),
            self.medical_record_number.as_ref().and_then(Value::as_str),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationIssue {
    #[error("an access token or medical record number is required")]
    MissingIdentifier,
    #[error("staff name is required")]
    MissingStaffName,
    #[error("patient signature is required")]
    MissingSignature,
    #[error("{field} must be text")]
    NotText { field: &'static str },
    #[error("{checklist} is required")]
    MissingChecklist { checklist: &'static str },
    #[error("{checklist} is missing item {key}")]
    MissingChecklistItem {
        checklist: &'static str,
        key: &'static str,
    },
    #[error("{checklist} item {key} is not confirmed")]
    UnconfirmedItem {
        checklist: &'static str,
        key: &'static str,
    },
}

/// Every problem found in one submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Submission incomplete ({} issue(s)): complete all sections", .issues.len())]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl From<ValidationIssue> for ValidationError {
    fn from(issue: ValidationIssue) -> Self {
        Self {
            issues: vec![issue],
        }
    }
}

/// A submission that passed every check. Free-text fields keep the exact
/// bytes the client sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubmission {
    pub staff_name: String,
    pub patient_checklist: PatientConsentChecklist,
    pub staff_checklist: StaffVerificationChecklist,
    pub physician_note: Option<String>,
    pub signature_image: String,
}

impl ValidatedSubmission {
    pub fn into_consent(self, approved_at: DateTime<Utc>) -> ApprovedConsent {
        ApprovedConsent {
            approved_at,
            patient_checklist: self.patient_checklist,
            staff_checklist: self.staff_checklist,
            staff_name: self.staff_name,
            physician_note: self.physician_note,
            signature_image: self.signature_image,
        }
    }
}

pub fn validate(payload: &SubmissionPayload) -> Result<ValidatedSubmission, ValidationError> {
    let mut issues = Vec::new();

    if payload.identifier().is_none() {
        issues.push(ValidationIssue::MissingIdentifier);
    }

    let staff_name = match Text::of(payload.staff_name.as_ref()) {
        Text::Present(s) if !s.trim().is_empty() => Some(s),
        Text::WrongType => {
            issues.push(ValidationIssue::NotText { field: "staffName" });
            None
        }
        _ => {
            issues.push(ValidationIssue::MissingStaffName);
            None
        }
    };

    let patient_checklist = read_checklist(
        payload.patient_checklist.as_ref(),
        PatientConsentChecklist::LABEL,
        PatientConsentChecklist::from_raw,
        PatientConsentChecklist::unconfirmed_keys,
        &mut issues,
    );
    let staff_checklist = read_checklist(
        payload.staff_checklist.as_ref(),
        StaffVerificationChecklist::LABEL,
        StaffVerificationChecklist::from_raw,
        StaffVerificationChecklist::unconfirmed_keys,
        &mut issues,
    );

    let signature_image = match Text::of(payload.signature_image.as_ref()) {
        Text::Present(s) if !s.trim().is_empty() => Some(s),
        Text::WrongType => {
            issues.push(ValidationIssue::NotText {
                field: "signatureImage",
            });
            None
        }
        _ => {
            issues.push(ValidationIssue::MissingSignature);
            None
        }
    };

    // Optional, but kept byte for byte when sent, blank or not.
    let physician_note = match Text::of(payload.physician_note.as_ref()) {
        Text::Present(s) => Some(s.to_string()),
        Text::Absent => None,
        Text::WrongType => {
            issues.push(ValidationIssue::NotText { field: "note" });
            None
        }
    };

    match (staff_name, patient_checklist, staff_checklist, signature_image) {
        (Some(staff_name), Some(patient_checklist), Some(staff_checklist), Some(signature))
            if issues.is_empty() =>
        {
            Ok(ValidatedSubmission {
                staff_name: staff_name.to_string(),
                patient_checklist,
                staff_checklist,
                physician_note,
                signature_image: signature.to_string(),
            })
        }
        _ => Err(ValidationError { issues }),
    }
}

/// A free-text field as sent.
enum Text<'a> {
    Absent,
    Present(&'a str),
    WrongType,
}

impl<'a> Text<'a> {
    fn of(raw: Option<&'a Value>) -> Self {
        match raw {
            None | Some(Value::Null) => Text::Absent,
            Some(Value::String(s)) => Text::Present(s.as_str()),
            Some(_) => Text::WrongType,
        }
    }
}

/// Read one checklist, appending every issue it carries.
fn read_checklist<T>(
    raw: Option<&Value>,
    label: &'static str,
    parse: fn(&serde_json::Map<String, Value>) -> ChecklistParse<T>,
    unconfirmed: fn(&T) -> Vec<&'static str>,
    issues: &mut Vec<ValidationIssue>,
) -> Option<T> {
    let Some(Value::Object(map)) = raw else {
        issues.push(ValidationIssue::MissingChecklist { checklist: label });
        return None;
    };

    let ChecklistParse {
        checklist,
        missing_keys,
    } = parse(map);

    for key in &missing_keys {
        issues.push(ValidationIssue::MissingChecklistItem {
            checklist: label,
            key: *key,
        });
    }
    for key in unconfirmed(&checklist) {
        if !missing_keys.contains(&key) {
            issues.push(ValidationIssue::UnconfirmedItem {
                checklist: label,
                key,
            });
        }
    }

    Some(checklist)
}
