use std::collections::BTreeMap;

use medrova_core::{AppError, AppResult};

use crate::record::GatedRecordType;

/// Discriminant for the fixed set of gating strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GatingRuleKind {
    /// Restricts rows by location-basis membership.
    LocationBasis,
    /// Restricts rows by encounter-type view privilege.
    EncounterTypePrivilege,
    /// Restricts rows by program-granted roles.
    ProgramRole,
}

/// One enforcement strategy bound to a record type.
///
/// The catalog is fixed: these are hard-coded gating strategies, not
/// user-authorable policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatingRule {
    /// Rows must belong to a record owner reachable through the principal's
    /// location grants.
    LocationBasis {
        /// Record type the rule applies to.
        record_type: GatedRecordType,
    },
    /// Rows whose encounter type requires a view privilege are visible only
    /// to principals holding it.
    EncounterTypePrivilege {
        /// Record type the rule applies to.
        record_type: GatedRecordType,
    },
    /// Rows are visible only when the principal holds a program-granted
    /// role; enforced at query level only.
    ProgramRole {
        /// Record type the rule applies to.
        record_type: GatedRecordType,
    },
}

impl GatingRule {
    /// Returns the record type this rule applies to.
    #[must_use]
    pub fn record_type(&self) -> GatedRecordType {
        match self {
            Self::LocationBasis { record_type }
            | Self::EncounterTypePrivilege { record_type }
            | Self::ProgramRole { record_type } => *record_type,
        }
    }

    /// Returns the strategy discriminant.
    #[must_use]
    pub fn kind(&self) -> GatingRuleKind {
        match self {
            Self::LocationBasis { .. } => GatingRuleKind::LocationBasis,
            Self::EncounterTypePrivilege { .. } => GatingRuleKind::EncounterTypePrivilege,
            Self::ProgramRole { .. } => GatingRuleKind::ProgramRole,
        }
    }

    /// Returns the query-level filter name this rule populates.
    #[must_use]
    pub fn filter_name(&self) -> String {
        match self {
            Self::LocationBasis { record_type } => {
                format!("row_access.location.{record_type}")
            }
            Self::EncounterTypePrivilege { record_type } => {
                format!("row_access.encounter_privilege.{record_type}")
            }
            Self::ProgramRole { record_type } => {
                format!("row_access.program_role.{record_type}")
            }
        }
    }

    /// Returns the configuration key that disables exactly this filter.
    #[must_use]
    pub fn disable_config_key(&self) -> String {
        format!("{}.disabled", self.filter_name())
    }

    /// Returns the privilege whose holder skips exactly this filter.
    #[must_use]
    pub fn bypass_privilege(&self) -> String {
        format!("Bypass Row Access: {}", self.filter_name())
    }
}

/// Registry mapping record-type tags to their ordered gating rules.
///
/// Built once at startup and passed by reference; registering a second rule
/// of the same kind for one record type is rejected rather than silently
/// shadowed.
#[derive(Debug, Clone, Default)]
pub struct GatingRegistry {
    rules: BTreeMap<GatedRecordType, Vec<GatingRule>>,
}

impl GatingRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the standard catalog: location gating for every record type,
    /// encounter-privilege gating for encounters and their sub-records,
    /// program-role gating for program enrollments.
    pub fn standard() -> AppResult<Self> {
        let mut registry = Self::new();

        for record_type in GatedRecordType::all() {
            registry.register(GatingRule::LocationBasis {
                record_type: *record_type,
            })?;
        }

        for record_type in [
            GatedRecordType::Encounter,
            GatedRecordType::Observation,
            GatedRecordType::Condition,
            GatedRecordType::Diagnosis,
        ] {
            registry.register(GatingRule::EncounterTypePrivilege { record_type })?;
        }

        registry.register(GatingRule::ProgramRole {
            record_type: GatedRecordType::ProgramEnrollment,
        })?;

        Ok(registry)
    }

    /// Registers one rule; rejects a duplicate kind for the record type.
    pub fn register(&mut self, rule: GatingRule) -> AppResult<()> {
        let rules = self.rules.entry(rule.record_type()).or_default();

        if rules.iter().any(|existing| existing.kind() == rule.kind()) {
            return Err(AppError::Conflict(format!(
                "a {:?} rule is already registered for record type '{}'",
                rule.kind(),
                rule.record_type()
            )));
        }

        rules.push(rule);
        Ok(())
    }

    /// Returns the ordered rules for a record type.
    #[must_use]
    pub fn rules_for(&self, record_type: GatedRecordType) -> &[GatingRule] {
        self.rules
            .get(&record_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns every registered rule across all record types.
    pub fn all_rules(&self) -> impl Iterator<Item = &GatingRule> {
        self.rules.values().flatten()
    }
}
