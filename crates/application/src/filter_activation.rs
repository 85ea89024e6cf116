use std::collections::BTreeSet;
use std::sync::Arc;

use medrova_core::{AppResult, Principal, RequestScope};
use medrova_domain::{
    BasisType, FilterParameterSets, GatingRegistry, GatingRuleKind, PARAM_ATTRIBUTE_TYPE_ID,
    PARAM_BASIS_IDS, PARAM_GRANTED_ROLES, PARAM_RECORD_OWNER_IDS, PARAM_ROLES, ParameterValue,
    sentinel_guarded,
};
use tracing::debug;

use crate::{AccessContext, AccessResolver, EnforcementConfig};

/// Activates query-level filter parameters once per unit of work.
///
/// Activation resolves the principal's access sets and binds them as named
/// filter parameters on the caller's [`AccessContext`]. The context's
/// `Activating` interim state makes re-entry structurally impossible: the
/// resolver's own lookups run while the context is mid-activation, and any
/// nested `activate` call short-circuits instead of recursing.
#[derive(Clone)]
pub struct FilterActivationService {
    resolver: AccessResolver,
    registry: Arc<GatingRegistry>,
    config: EnforcementConfig,
}

/// Location access sets resolved once and shared by every location filter.
struct LocationParameters {
    attribute_type_id: i64,
    record_owner_ids: BTreeSet<String>,
    basis_ids: BTreeSet<String>,
}

impl FilterActivationService {
    /// Creates the activation service.
    #[must_use]
    pub fn new(
        resolver: AccessResolver,
        registry: Arc<GatingRegistry>,
        config: EnforcementConfig,
    ) -> Self {
        Self {
            resolver,
            registry,
            config,
        }
    }

    /// Resolves and binds filter parameters, exactly once per context.
    ///
    /// Calling again on an `Activating` or `Active` context returns
    /// immediately without repeating any resolution work. A resolution
    /// failure resets the context so a later attempt starts clean; it never
    /// leaves a half-populated parameter set behind.
    pub async fn activate(&self, context: &mut AccessContext) -> AppResult<()> {
        if !context.begin_activation() {
            return Ok(());
        }

        match self.resolve_parameters(context.scope()).await {
            Ok(parameters) => {
                context.complete_activation(parameters);
                Ok(())
            }
            Err(error) => {
                context.reset();
                Err(error)
            }
        }
    }

    /// Returns the context to its inactive state.
    ///
    /// Invoked after every grant mutation and at the end of the unit of
    /// work; the next `activate` re-resolves from committed state.
    pub fn reset(&self, context: &mut AccessContext) {
        context.reset();
    }

    async fn resolve_parameters(&self, scope: &RequestScope) -> AppResult<FilterParameterSets> {
        let mut parameters = FilterParameterSets::new();

        if scope.is_background() {
            debug!("skipping filter activation for background scope");
            return Ok(parameters);
        }

        let Some(principal) = scope.principal() else {
            debug!("skipping filter activation for unauthenticated scope");
            return Ok(parameters);
        };

        if principal.is_superuser() {
            debug!(subject = principal.subject(), "superuser bypasses filters");
            return Ok(parameters);
        }

        let mut location: Option<LocationParameters> = None;
        let mut program_roles: Option<BTreeSet<String>> = None;

        for rule in self.registry.all_rules() {
            if self.config.is_rule_disabled(rule).await? {
                debug!(filter = %rule.filter_name(), "filter disabled by config");
                continue;
            }

            if self.config.is_rule_bypassed_by(rule, principal) {
                debug!(
                    filter = %rule.filter_name(),
                    subject = principal.subject(),
                    "filter bypassed by privilege"
                );
                continue;
            }

            let filter = rule.filter_name();
            match rule.kind() {
                GatingRuleKind::LocationBasis => {
                    if location.is_none() {
                        location = Some(self.resolve_location_parameters(principal).await?);
                    }
                    let Some(resolved) = location.as_ref() else {
                        continue;
                    };

                    parameters.set(
                        filter.clone(),
                        PARAM_ATTRIBUTE_TYPE_ID,
                        ParameterValue::Int(resolved.attribute_type_id),
                    );
                    parameters.set(
                        filter.clone(),
                        PARAM_RECORD_OWNER_IDS,
                        ParameterValue::StrSet(resolved.record_owner_ids.clone()),
                    );
                    parameters.set(
                        filter,
                        PARAM_BASIS_IDS,
                        ParameterValue::StrSet(resolved.basis_ids.clone()),
                    );
                }
                GatingRuleKind::EncounterTypePrivilege => {
                    parameters.set(
                        filter,
                        PARAM_ROLES,
                        ParameterValue::StrSet(sentinel_guarded(principal.privileges().clone())),
                    );
                }
                GatingRuleKind::ProgramRole => {
                    let granted = match &program_roles {
                        Some(granted) => granted.clone(),
                        None => {
                            let resolved = self
                                .resolver
                                .role_based_basis_role_names(BasisType::Program)
                                .await?;
                            program_roles = Some(resolved.clone());
                            resolved
                        }
                    };

                    let held: BTreeSet<String> = principal
                        .roles()
                        .intersection(&granted)
                        .cloned()
                        .collect();

                    parameters.set(
                        filter.clone(),
                        PARAM_ROLES,
                        ParameterValue::StrSet(sentinel_guarded(held)),
                    );
                    parameters.set(
                        filter,
                        PARAM_GRANTED_ROLES,
                        ParameterValue::StrSet(sentinel_guarded(granted)),
                    );
                }
            }
        }

        Ok(parameters)
    }

    async fn resolve_location_parameters(
        &self,
        principal: &Principal,
    ) -> AppResult<LocationParameters> {
        let attribute_type_id = self
            .config
            .classification_attribute_id(BasisType::Location)
            .await?;
        let resolved = self
            .resolver
            .resolve_access_set(principal, BasisType::Location)
            .await?;

        Ok(LocationParameters {
            attribute_type_id,
            record_owner_ids: sentinel_guarded(resolved.record_owner_ids),
            basis_ids: sentinel_guarded(resolved.basis_ids),
        })
    }
}
