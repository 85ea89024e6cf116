use std::sync::Arc;

use medrova_core::{AppError, AppResult, Principal, RequestScope};
use medrova_domain::{
    BasisType, EncounterTypeRef, GatedRecord, GatingRegistry, GatingRuleKind, OwnerScope,
};
use tracing::{debug, warn};

use crate::{AccessResolver, EncounterDirectory, EnforcementConfig};

/// Load-time safety net over materialized record instances.
///
/// Query paths that bypass predicate injection (joins, caches, lazy loads)
/// still funnel every materialized record through this check. It is
/// independent of [`crate::AccessContext`] activation state: it re-derives
/// the principal's access from the same resolver and fails closed on its
/// own.
#[derive(Clone)]
pub struct LoadTimeGuard {
    resolver: AccessResolver,
    registry: Arc<GatingRegistry>,
    config: EnforcementConfig,
    encounters: Arc<dyn EncounterDirectory>,
}

impl LoadTimeGuard {
    /// Creates the guard.
    #[must_use]
    pub fn new(
        resolver: AccessResolver,
        registry: Arc<GatingRegistry>,
        config: EnforcementConfig,
        encounters: Arc<dyn EncounterDirectory>,
    ) -> Self {
        Self {
            resolver,
            registry,
            config,
            encounters,
        }
    }

    /// Verifies that the scope may see a record that just materialized.
    ///
    /// Background scopes and superusers pass unconditionally. Otherwise
    /// every registered rule for the record's type runs unless disabled by
    /// configuration or bypassed by a per-filter privilege; any rejection
    /// surfaces as [`AppError::AccessDenied`].
    pub async fn check_load(&self, scope: &RequestScope, record: &GatedRecord) -> AppResult<()> {
        if scope.is_background() {
            return Ok(());
        }

        let principal = scope.principal();
        if principal.map(Principal::is_superuser).unwrap_or(false) {
            return Ok(());
        }

        for rule in self.registry.rules_for(record.record_type()) {
            if self.config.is_rule_disabled(rule).await? {
                continue;
            }

            if let Some(principal) = principal {
                if self.config.is_rule_bypassed_by(rule, principal) {
                    debug!(
                        filter = %rule.filter_name(),
                        subject = principal.subject(),
                        "load check bypassed by privilege"
                    );
                    continue;
                }
            }

            match rule.kind() {
                GatingRuleKind::LocationBasis => {
                    self.check_location_basis(principal, record).await?;
                }
                GatingRuleKind::EncounterTypePrivilege => {
                    self.check_encounter_privilege(principal, record).await?;
                }
                // Program/role gating has no load-time dispatch; it is
                // enforced through query-level parameters only.
                GatingRuleKind::ProgramRole => {}
            }
        }

        Ok(())
    }

    async fn check_location_basis(
        &self,
        principal: Option<&Principal>,
        record: &GatedRecord,
    ) -> AppResult<()> {
        let Some(principal) = principal else {
            return Err(self.deny(record, "no principal in interactive scope"));
        };

        match record.owner_scope() {
            OwnerScope::Basis(basis_id) => {
                let assigned = self
                    .resolver
                    .assigned_basis_ids(principal, BasisType::Location)
                    .await?;
                if assigned.contains(basis_id) {
                    Ok(())
                } else {
                    Err(self.deny(record, "basis outside assigned set"))
                }
            }
            OwnerScope::RecordOwner(Some(owner_id)) => {
                let owners = self
                    .resolver
                    .accessible_record_owner_ids(principal, BasisType::Location)
                    .await?;
                if owners.contains(owner_id) {
                    Ok(())
                } else {
                    Err(self.deny(record, "owner outside accessible set"))
                }
            }
            OwnerScope::RecordOwner(None) => {
                // Owner link never populated in-flight: membership cannot be
                // established either way.
                if self.config.strict_mode().await? {
                    Err(self.deny(record, "owner link unset in strict mode"))
                } else {
                    debug!(
                        record_type = record.record_type().as_str(),
                        "owner link unset; allowed in non-strict mode"
                    );
                    Ok(())
                }
            }
        }
    }

    async fn check_encounter_privilege(
        &self,
        principal: Option<&Principal>,
        record: &GatedRecord,
    ) -> AppResult<()> {
        let encounter_type_id = match record.encounter_type_ref() {
            EncounterTypeRef::Unlinked => return Ok(()),
            EncounterTypeRef::Known(type_id) => type_id.to_owned(),
            EncounterTypeRef::NeedsLookup(encounter_id) => {
                match self.encounters.encounter_type_of(encounter_id).await? {
                    Some(type_id) => type_id,
                    None => return Ok(()),
                }
            }
        };

        let Some(required) = self.resolver.view_privilege_for(&encounter_type_id).await? else {
            return Ok(());
        };

        match principal {
            Some(principal) if principal.has_privilege(required.as_str()) => Ok(()),
            _ => Err(self.deny(record, "missing encounter view privilege")),
        }
    }

    fn deny(&self, record: &GatedRecord, reason: &str) -> AppError {
        // The reason stays in the log; the error carried to the caller is
        // fixed and reveals nothing about the record.
        warn!(
            record_type = record.record_type().as_str(),
            record_id = record.record_id(),
            reason,
            "rejected record load"
        );
        AppError::AccessDenied
    }
}
