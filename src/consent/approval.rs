//! Approval State Machine.
//!
//! Pending → Approved, once, never back. `submit` runs strictly in order:
//! resolve, status check, validate, guarded write. Each step gates the next
//! and any failure leaves the record untouched.
//!
//! The write is keyed by the resolved row's medical-record number, so
//! token- and number-based submissions for one encounter land on one row.
//! The store only writes while the row is still pending; a submission that
//! loses a race gets `AlreadyApproved` like any other resubmission.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::db::{ApproveOutcome, RecordStore};
use crate::models::{ApprovalStatus, Encounter};

use super::aggregate::{validate, SubmissionPayload};
use super::resolver::{IdentifierLookup, IdentifierResolver};
use super::ConsentError;

/// Public projection returned after a successful approval. The signature
/// and checklists are not echoed; the client already holds them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalSummary {
    pub medical_record_number: String,
    pub patient_name: String,
    pub status: ApprovalStatus,
    #[serde(rename = "note")]
    pub physician_note: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl From<&Encounter> for ApprovalSummary {
    fn from(encounter: &Encounter) -> Self {
        Self {
            medical_record_number: encounter.medical_record_number.clone(),
            patient_name: encounter.patient_name.clone(),
            status: encounter.approval_status(),
            physician_note: encounter
                .consent
                .as_ref()
                .and_then(|c| c.physician_note.clone()),
            approved_at: encounter.approved_at(),
        }
    }
}

pub struct ApprovalStateMachine<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> ApprovalStateMachine<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Approve the encounter with the server clock as `approved_at`.
    pub fn submit(
        &self,
        lookup: &IdentifierLookup,
        payload: &SubmissionPayload,
    ) -> Result<ApprovalSummary, ConsentError> {
        self.submit_at(lookup, payload, Utc::now())
    }

    pub fn submit_at(
        &self,
        lookup: &IdentifierLookup,
        payload: &SubmissionPayload,
        now: DateTime<Utc>,
    ) -> Result<ApprovalSummary, ConsentError> {
        let encounter = IdentifierResolver::new(self.store)
            .resolve(lookup)
            .inspect_err(|e| {
                if matches!(e, ConsentError::PatientNotFound) {
                    tracing::warn!("Consent submission for unknown encounter");
                }
            })?;
        let mrn = encounter.medical_record_number.as_str();

        if encounter.is_approved() {
            tracing::info!(
                medical_record_number = %mrn,
                "Resubmission rejected: consent already approved"
            );
            return Err(ConsentError::AlreadyApproved);
        }

        let validated = validate(payload).inspect_err(|e| {
            tracing::info!(
                medical_record_number = %mrn,
                issues = e.issues.len(),
                "Consent submission failed validation"
            );
        })?;

        let fingerprint = signature_fingerprint(&validated.signature_image);
        let consent = validated.into_consent(now);

        match self.store.conditional_approve(mrn, &consent)? {
            ApproveOutcome::Approved(approved) => {
                tracing::info!(
                    medical_record_number = %mrn,
                    staff_name = %consent.staff_name,
                    signature_sha256 = %fingerprint,
                    "Consent approved"
                );
                Ok(ApprovalSummary::from(&approved))
            }
            ApproveOutcome::AlreadyApproved => {
                tracing::warn!(
                    medical_record_number = %mrn,
                    "Concurrent submission lost the approval race"
                );
                Err(ConsentError::AlreadyApproved)
            }
            ApproveOutcome::Missing => {
                tracing::warn!(
                    medical_record_number = %mrn,
                    "Encounter disappeared before approval"
                );
                Err(ConsentError::PatientNotFound)
            }
        }
    }
}

/// SHA-256 of the signature payload, for logs that must not carry the image.
pub fn signature_fingerprint(signature_image: &str) -> String {
    format!("{:x}", Sha256::digest(signature_image.as_bytes()))
}
