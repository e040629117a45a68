//! Identifier Resolver.
//!
//! Order: the access token against `identifier_token`, then the
//! medical-record number against `medical_record_number`. When only one
//! value was supplied (a booklet link carries a single path segment) that
//! value is also tried as a record number, so legacy links keep working.
//! Matching is exact.

use crate::db::RecordStore;
use crate::models::Encounter;

use super::ConsentError;

/// The identifier(s) a caller supplied. Empty strings count as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierLookup {
    token: Option<String>,
    medical_record_number: Option<String>,
}

impl IdentifierLookup {
    /// `None` when neither identifier is present.
    pub fn new(token: Option<&str>, medical_record_number: Option<&str>) -> Option<Self> {
        let token = token.filter(|t| !t.is_empty()).map(str::to_string);
        let medical_record_number = medical_record_number
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        if token.is_none() && medical_record_number.is_none() {
            return None;
        }
        Some(Self {
            token,
            medical_record_number,
        })
    }

    /// A single value of unknown kind, tried as a token first.
    pub fn single(value: &str) -> Option<Self> {
        Self::new(Some(value), None)
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn medical_record_number(&self) -> Option<&str> {
        self.medical_record_number.as_deref()
    }

    /// Value to try against the record-number column, if any.
    fn record_number_candidate(&self) -> Option<&str> {
        self.medical_record_number.as_deref().or(self.token.as_deref())
    }
}

pub struct IdentifierResolver<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> IdentifierResolver<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Read-only. `PatientNotFound` when no step matches.
    pub fn resolve(&self, lookup: &IdentifierLookup) -> Result<Encounter, ConsentError> {
        if let Some(token) = lookup.token() {
            if let Some(encounter) = self.store.find_by_token(token)? {
                tracing::debug!(
                    medical_record_number = %encounter.medical_record_number,
                    "Encounter resolved by access token"
                );
                return Ok(encounter);
            }
        }

        if let Some(number) = lookup.record_number_candidate() {
            if let Some(encounter) = self.store.find_by_medical_record_number(number)? {
                tracing::debug!(
                    medical_record_number = %encounter.medical_record_number,
                    "Encounter resolved by medical record number"
                );
                return Ok(encounter);
            }
        }

        Err(ConsentError::PatientNotFound)
    }
}
