//! Booklet checklists: six patient acknowledgements and five staff
//! per-section verifications.
//!
//! Client payloads are loosely typed JSON objects. Reading one goes through
//! `from_raw`, which records absent keys and coerces non-boolean values to
//! `false` so a malformed item blocks approval instead of vanishing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result of reading a checklist out of a raw JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistParse<T> {
    pub checklist: T,
    pub missing_keys: Vec<&'static str>,
}

macro_rules! checklist {
    ($(#[$meta:meta])* $name:ident, $label:literal { $($field:ident => $key:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            $(
                #[serde(rename = $key)]
                pub $field: bool,
            )+
        }

        impl $name {
            /// Name used in validation messages.
            pub const LABEL: &'static str = $label;
            /// Wire keys, in booklet order.
            pub const KEYS: &'static [&'static str] = &[$($key),+];

            /// Every item ticked.
            pub fn confirmed() -> Self {
                Self { $($field: true),+ }
            }

            pub fn all_confirmed(&self) -> bool {
                true $(&& self.$field)+
            }

            pub fn unconfirmed_keys(&self) -> Vec<&'static str> {
                let mut keys = Vec::new();
                $(
                    if !self.$field {
                        keys.push($key);
                    }
                )+
                keys
            }

            pub fn from_raw(raw: &Map<String, Value>) -> ChecklistParse<Self> {
                let mut missing_keys = Vec::new();
                let checklist = Self {
                    $(
                        $field: match raw.get($key) {
                            Some(value) => value.as_bool().unwrap_or(false),
                            None => {
                                missing_keys.push($key);
                                false
                            }
                        },
                    )+
                };
                ChecklistParse { checklist, missing_keys }
            }
        }
    };
}

checklist!(
    /// Patient acknowledgements from the consent section of the booklet.
    PatientConsentChecklist, "patient consent checklist" {
        understands_indication => "check1",
        agrees_to_schedule => "check2",
        understands_risks => "check3",
        follows_preparation => "check4",
        understands_pain_management => "check5",
        follows_infection_prevention => "check6",
    }
);

checklist!(
    /// Staff verification that each explanatory section was walked through
    /// with the patient.
    StaffVerificationChecklist, "staff verification checklist" {
        patient_information => "patient_information",
        mental_preparation => "mental_preparation",
        physical_preparation => "physical_preparation",
        infection_prevention => "infection_prevention",
        pain_management => "pain_management",
    }
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn key_counts_match_booklet() {
        assert_eq!(PatientConsentChecklist::KEYS.len(), 6);
        assert_eq!(StaffVerificationChecklist::KEYS.len(), 5);
    }

    #[test]
    fn complete_true_checklist_is_confirmed() {
        let raw = object(json!({
            "check1": true, "check2": true, "check3": true,
            "check4": true, "check5": true, "check6": true,
        }));
        let parsed = PatientConsentChecklist::from_raw(&raw);
        assert!(parsed.missing_keys.is_empty());
        assert!(parsed.checklist.all_confirmed());
        assert_eq!(parsed.checklist, PatientConsentChecklist::confirmed());
    }

    #[test]
    fn false_item_is_reported_unconfirmed() {
        let raw = object(json!({
            "check1": true, "check2": true, "check3": false,
            "check4": true, "check5": true, "check6": true,
        }));
        let parsed = PatientConsentChecklist::from_raw(&raw);
        assert!(!parsed.checklist.all_confirmed());
        assert_eq!(parsed.checklist.unconfirmed_keys(), vec!["check3"]);
    }

    #[test]
    fn non_boolean_values_coerce_to_false() {
        let raw = object(json!({
            "patient_information": "yes",
            "mental_preparation": 1,
            "physical_preparation": null,
            "infection_prevention": true,
            "pain_management": {"nested": true},
        }));
        let parsed = StaffVerificationChecklist::from_raw(&raw);
        assert!(parsed.missing_keys.is_empty());
        assert_eq!(
            parsed.checklist.unconfirmed_keys(),
            vec![
                "patient_information",
                "mental_preparation",
                "physical_preparation",
                "pain_management",
            ]
        );
    }

    #[test]
    fn absent_keys_are_recorded() {
        let raw = object(json!({ "check1": true, "check6": true }));
        let parsed = PatientConsentChecklist::from_raw(&raw);
        assert_eq!(parsed.missing_keys, vec!["check2", "check3", "check4", "check5"]);
        assert!(!parsed.checklist.all_confirmed());
    }

    #[test]
    fn extra_keys_are_ignored() {
        let raw = object(json!({
            "patient_information": true,
            "mental_preparation": true,
            "physical_preparation": true,
            "infection_prevention": true,
            "pain_management": true,
            "surprise": "value",
        }));
        let parsed = StaffVerificationChecklist::from_raw(&raw);
        assert!(parsed.missing_keys.is_empty());
        assert!(parsed.checklist.all_confirmed());
        let stored = serde_json::to_value(parsed.checklist).unwrap();
        assert!(stored.get("surprise").is_none());
    }

    #[test]
    fn serializes_with_wire_keys() {
        let value = serde_json::to_value(PatientConsentChecklist::confirmed()).unwrap();
        for key in PatientConsentChecklist::KEYS {
            assert_eq!(value[*key], true);
        }
    }
}
