//! Surgical consent workflow.
//!
//! An encounter is looked up by its access token (or legacy medical-record
//! number), shown to the patient and a witnessing staff member while
//! pending, and approved exactly once with both checklists, the staff name,
//! an optional physician note and the patient's signature.
//!
//! - `resolver`: identifier → encounter
//! - `aggregate`: submission payload validation
//! - `approval`: the Pending → Approved transition
//! - `view`: read-only reconstruction for display

pub mod aggregate;
pub mod approval;
pub mod resolver;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::{SubmissionPayload, ValidatedSubmission, ValidationError, ValidationIssue};
pub use approval::{ApprovalStateMachine, ApprovalSummary};
pub use resolver::{IdentifierLookup, IdentifierResolver};
pub use view::{reconstruct, ConsentForm, ConsentView};

use thiserror::Error;

use crate::db::{DatabaseError, RecordStore};

#[derive(Error, Debug)]
pub enum ConsentError {
    #[error("No encounter matches the supplied identifier")]
    PatientNotFound,

    #[error("Consent for this encounter was already approved")]
    AlreadyApproved,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Record store unavailable: {0}")]
    Store(#[from] DatabaseError),
}

impl ConsentError {
    /// Only a failing store may succeed on retry; nothing was written.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConsentError::Store(e) if e.is_transient())
    }
}

/// Resolve an encounter and reconstruct its current view.
pub fn load_view(
    store: &dyn RecordStore,
    lookup: &IdentifierLookup,
) -> Result<ConsentView, ConsentError> {
    let encounter = IdentifierResolver::new(store).resolve(lookup)?;
    Ok(reconstruct(&encounter))
}
