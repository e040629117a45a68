pub mod repository;
pub mod sqlite;
pub mod store;

pub use repository::*;
pub use sqlite::*;
pub use store::{ApproveOutcome, RecordStore, SqliteRecordStore};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Corrupt record {medical_record_number}: {reason}")]
    CorruptRecord {
        medical_record_number: String,
        reason: String,
    },

    #[error("Checklist serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal lock error")]
    LockPoisoned,
}

impl DatabaseError {
    /// Failures of the store itself, as opposed to bad data in it.
    pub fn is_transient(&self) -> bool {
        matches!(self, DatabaseError::Sqlite(_) | DatabaseError::LockPoisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_store_failures_are_transient() {
        assert!(DatabaseError::LockPoisoned.is_transient());
        assert!(DatabaseError::Sqlite(rusqlite::Error::InvalidQuery).is_transient());
        assert!(!DatabaseError::CorruptRecord {
            medical_record_number: "MR-0001".into(),
            reason: "approved without signature".into(),
        }
        .is_transient());
        assert!(!DatabaseError::ConstraintViolation("duplicate token".into()).is_transient());
        assert!(!DatabaseError::InvalidEnum {
            field: "ApprovalStatus".into(),
            value: "Disetujui".into(),
        }
        .is_transient());
    }
}
