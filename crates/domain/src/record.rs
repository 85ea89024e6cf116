use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Type tags for the closed set of gated record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatedRecordType {
    /// Person-rooted patient record.
    Patient,
    /// Patient visit.
    Visit,
    /// Clinical encounter.
    Encounter,
    /// Observation captured during care.
    Observation,
    /// Condition on a patient's problem list.
    Condition,
    /// Diagnosis recorded against an encounter.
    Diagnosis,
    /// Enrollment of a patient in a care program.
    ProgramEnrollment,
    /// Care provider record.
    Provider,
    /// Platform user account.
    User,
    /// Location record; doubles as a basis.
    Location,
}

impl GatedRecordType {
    /// Returns a stable storage value for this record type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Visit => "visit",
            Self::Encounter => "encounter",
            Self::Observation => "observation",
            Self::Condition => "condition",
            Self::Diagnosis => "diagnosis",
            Self::ProgramEnrollment => "program_enrollment",
            Self::Provider => "provider",
            Self::User => "user",
            Self::Location => "location",
        }
    }

    /// Returns all known gated record types.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[GatedRecordType] = &[
            GatedRecordType::Patient,
            GatedRecordType::Visit,
            GatedRecordType::Encounter,
            GatedRecordType::Observation,
            GatedRecordType::Condition,
            GatedRecordType::Diagnosis,
            GatedRecordType::ProgramEnrollment,
            GatedRecordType::Provider,
            GatedRecordType::User,
            GatedRecordType::Location,
        ];

        ALL
    }
}

impl Display for GatedRecordType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

/// In-flight reference from a sub-record to its encounter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncounterLink {
    /// Linked encounter identifier.
    pub encounter_id: String,
    /// Encounter type identifier, when the encounter was already loaded.
    pub encounter_type_id: Option<String>,
}

/// Which identifier a location-basis check must test, and against what.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerScope<'a> {
    /// Test a record-owner (person) identifier against the accessible
    /// record-owner set. `None` means the link field was never populated
    /// in-flight.
    RecordOwner(Option<&'a str>),
    /// Test the record's own identifier against the assigned basis set.
    Basis(&'a str),
}

/// How a record resolves to an encounter type for privilege gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterTypeRef<'a> {
    /// No linked encounter; the record is exempt from encounter gating.
    Unlinked,
    /// Encounter type already present in in-flight state.
    Known(&'a str),
    /// Linked encounter whose type must be looked up by encounter id.
    NeedsLookup(&'a str),
}

/// One materialized record instance of a gated type.
///
/// Variants carry the in-flight field state available at load time; link
/// fields are optional because lazy loading may materialize a record before
/// its associations. Extraction never issues queries of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatedRecord {
    /// Patient record; owns itself.
    Patient {
        /// Patient identifier.
        patient_id: String,
    },
    /// Visit linked to a patient.
    Visit {
        /// Visit identifier.
        visit_id: String,
        /// Linked patient identifier, when populated.
        patient_id: Option<String>,
    },
    /// Encounter linked to a patient and an encounter type.
    Encounter {
        /// Encounter identifier.
        encounter_id: String,
        /// Linked patient identifier, when populated.
        patient_id: Option<String>,
        /// Encounter type identifier, when populated.
        encounter_type_id: Option<String>,
    },
    /// Observation linked to a person and optionally an encounter.
    Observation {
        /// Observation identifier.
        observation_id: String,
        /// Linked person identifier, when populated.
        person_id: Option<String>,
        /// Linked encounter, when any.
        encounter: Option<EncounterLink>,
    },
    /// Condition linked to a patient and optionally an encounter.
    Condition {
        /// Condition identifier.
        condition_id: String,
        /// Linked patient identifier, when populated.
        patient_id: Option<String>,
        /// Linked encounter, when any.
        encounter: Option<EncounterLink>,
    },
    /// Diagnosis linked to a patient and optionally an encounter.
    Diagnosis {
        /// Diagnosis identifier.
        diagnosis_id: String,
        /// Linked patient identifier, when populated.
        patient_id: Option<String>,
        /// Linked encounter, when any.
        encounter: Option<EncounterLink>,
    },
    /// Program enrollment linked to a patient.
    ProgramEnrollment {
        /// Enrollment identifier.
        enrollment_id: String,
        /// Linked patient identifier, when populated.
        patient_id: Option<String>,
    },
    /// Provider linked to a person.
    Provider {
        /// Provider identifier.
        provider_id: String,
        /// Linked person identifier, when populated.
        person_id: Option<String>,
    },
    /// User account linked to a person.
    User {
        /// User identifier.
        user_id: String,
        /// Linked person identifier, when populated.
        person_id: Option<String>,
    },
    /// Location record.
    Location {
        /// Location identifier.
        location_id: String,
    },
}

impl GatedRecord {
    /// Returns the type tag for this record.
    #[must_use]
    pub fn record_type(&self) -> GatedRecordType {
        match self {
            Self::Patient { .. } => GatedRecordType::Patient,
            Self::Visit { .. } => GatedRecordType::Visit,
            Self::Encounter { .. } => GatedRecordType::Encounter,
            Self::Observation { .. } => GatedRecordType::Observation,
            Self::Condition { .. } => GatedRecordType::Condition,
            Self::Diagnosis { .. } => GatedRecordType::Diagnosis,
            Self::ProgramEnrollment { .. } => GatedRecordType::ProgramEnrollment,
            Self::Provider { .. } => GatedRecordType::Provider,
            Self::User { .. } => GatedRecordType::User,
            Self::Location { .. } => GatedRecordType::Location,
        }
    }

    /// Returns the record's own identifier.
    #[must_use]
    pub fn record_id(&self) -> &str {
        match self {
            Self::Patient { patient_id } => patient_id,
            Self::Visit { visit_id, .. } => visit_id,
            Self::Encounter { encounter_id, .. } => encounter_id,
            Self::Observation { observation_id, .. } => observation_id,
            Self::Condition { condition_id, .. } => condition_id,
            Self::Diagnosis { diagnosis_id, .. } => diagnosis_id,
            Self::ProgramEnrollment { enrollment_id, .. } => enrollment_id,
            Self::Provider { provider_id, .. } => provider_id,
            Self::User { user_id, .. } => user_id,
            Self::Location { location_id } => location_id,
        }
    }

    /// Returns the identifier a location-basis check must test.
    #[must_use]
    pub fn owner_scope(&self) -> OwnerScope<'_> {
        match self {
            Self::Patient { patient_id } => OwnerScope::RecordOwner(Some(patient_id)),
            Self::Visit { patient_id, .. }
            | Self::Encounter { patient_id, .. }
            | Self::Condition { patient_id, .. }
            | Self::Diagnosis { patient_id, .. }
            | Self::ProgramEnrollment { patient_id, .. } => {
                OwnerScope::RecordOwner(patient_id.as_deref())
            }
            Self::Observation { person_id, .. }
            | Self::Provider { person_id, .. }
            | Self::User { person_id, .. } => OwnerScope::RecordOwner(person_id.as_deref()),
            Self::Location { location_id } => OwnerScope::Basis(location_id),
        }
    }

    /// Returns how this record resolves to an encounter type.
    #[must_use]
    pub fn encounter_type_ref(&self) -> EncounterTypeRef<'_> {
        match self {
            Self::Encounter {
                encounter_id,
                encounter_type_id,
                ..
            } => match encounter_type_id {
                Some(type_id) => EncounterTypeRef::Known(type_id),
                None => EncounterTypeRef::NeedsLookup(encounter_id),
            },
            Self::Observation { encounter, .. }
            | Self::Condition { encounter, .. }
            | Self::Diagnosis { encounter, .. } => match encounter {
                Some(link) => match &link.encounter_type_id {
                    Some(type_id) => EncounterTypeRef::Known(type_id),
                    None => EncounterTypeRef::NeedsLookup(&link.encounter_id),
                },
                None => EncounterTypeRef::Unlinked,
            },
            _ => EncounterTypeRef::Unlinked,
        }
    }
}
