//! Record Store: the single source of truth for encounters.
//!
//! Consent logic talks to the store only through `RecordStore`, so the
//! SQLite-backed implementation is constructed once at start-up and injected
//! wherever it is needed. Tests swap in their own implementations.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior};

use super::repository::{
    approve_encounter, generate_access_token, get_encounter_by_medical_record_number,
    get_encounter_by_token, insert_encounter,
};
use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;
use crate::models::{ApprovedConsent, Encounter, NewEncounter};

/// Result of a guarded approval write.
#[derive(Debug, Clone, PartialEq)]
pub enum ApproveOutcome {
    /// The row was pending and now holds the approval.
    Approved(Encounter),
    /// The row was already approved; nothing was written.
    AlreadyApproved,
    /// No row with that medical-record number exists.
    Missing,
}

pub trait RecordStore: Send + Sync {
    fn find_by_token(&self, identifier_token: &str) -> Result<Option<Encounter>, DatabaseError>;

    fn find_by_medical_record_number(
        &self,
        medical_record_number: &str,
    ) -> Result<Option<Encounter>, DatabaseError>;

    /// Exact-match lookup of a single value: token first, then medical-record number.
    fn find_by_identifier(&self, identifier: &str) -> Result<Option<Encounter>, DatabaseError> {
        if let Some(encounter) = self.find_by_token(identifier)? {
            return Ok(Some(encounter));
        }
        self.find_by_medical_record_number(identifier)
    }

    /// Atomically approve the encounter, only if it is still pending.
    fn conditional_approve(
        &self,
        medical_record_number: &str,
        consent: &ApprovedConsent,
    ) -> Result<ApproveOutcome, DatabaseError>;
}

/// `RecordStore` over a single SQLite connection.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_database(path)?))
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_memory_database()?))
    }

    /// Wrap an already-migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }

    /// Seed a pending encounter. Back-office use; generates a token when
    /// none is supplied.
    pub fn insert_encounter(&self, encounter: &NewEncounter) -> Result<Encounter, DatabaseError> {
        let token = encounter
            .identifier_token
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(generate_access_token);

        let conn = self.lock()?;
        insert_encounter(&conn, encounter, &token, Utc::now())?;
        get_encounter_by_token(&conn, &token)?.ok_or_else(|| DatabaseError::CorruptRecord {
            medical_record_number: encounter.medical_record_number.clone(),
            reason: "inserted row not readable".into(),
        })
    }
}

impl RecordStore for SqliteRecordStore {
    fn find_by_token(&self, identifier_token: &str) -> Result<Option<Encounter>, DatabaseError> {
        let conn = self.lock()?;
        get_encounter_by_token(&conn, identifier_token)
    }

    fn find_by_medical_record_number(
        &self,
        medical_record_number: &str,
    ) -> Result<Option<Encounter>, DatabaseError> {
        let conn = self.lock()?;
        get_encounter_by_medical_record_number(&conn, medical_record_number)
    }

    fn conditional_approve(
        &self,
        medical_record_number: &str,
        consent: &ApprovedConsent,
    ) -> Result<ApproveOutcome, DatabaseError> {
        let mut conn = self.lock()?;
        // IMMEDIATE takes the write lock up front, so a second process
        // cannot slip in between the guarded update and the read-back.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let changed = approve_encounter(&tx, medical_record_number, consent)?;
        let current = get_encounter_by_medical_record_number(&tx, medical_record_number)?;

        let outcome = match (changed, current) {
            (1, Some(encounter)) => ApproveOutcome::Approved(encounter),
            (_, None) => ApproveOutcome::Missing,
            (0, Some(encounter)) if encounter.is_approved() => ApproveOutcome::AlreadyApproved,
            (n, Some(_)) => {
                return Err(DatabaseError::CorruptRecord {
                    medical_record_number: medical_record_number.to_string(),
                    reason: format!("guarded approval changed {n} rows"),
                })
            }
        };

        tx.commit()?;
        Ok(outcome)
    }
}
