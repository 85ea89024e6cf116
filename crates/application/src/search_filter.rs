use std::collections::BTreeSet;

use medrova_core::{AppError, AppResult, RequestScope};
use medrova_domain::{BasisType, GatedRecordType, GatingRule, sentinel_guarded};

use crate::{AccessResolver, EnforcementConfig};

/// Record types carried by the full-text index.
const INDEXED_RECORD_TYPES: &[GatedRecordType] = &[
    GatedRecordType::Patient,
    GatedRecordType::Visit,
    GatedRecordType::Encounter,
    GatedRecordType::Observation,
];

/// Owner restriction applied to one full-text search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchScope {
    /// No restriction; background, superuser, or disabled-filter searches.
    Unrestricted,
    /// Restrict hits to records owned by these identifiers.
    OwnerIds(BTreeSet<String>),
}

/// Applies the resolved owner set to full-text search queries.
#[derive(Clone)]
pub struct SearchFilterAdapter {
    resolver: AccessResolver,
    config: EnforcementConfig,
}

impl SearchFilterAdapter {
    /// Creates the adapter.
    #[must_use]
    pub fn new(resolver: AccessResolver, config: EnforcementConfig) -> Self {
        Self { resolver, config }
    }

    /// Returns the owner restriction for a search over the given types.
    ///
    /// A search may target at most one indexed type: the underlying
    /// predicate cannot be scoped unambiguously across heterogeneous result
    /// types in a single pass.
    pub async fn owner_scope_for_search(
        &self,
        scope: &RequestScope,
        record_types: &[GatedRecordType],
    ) -> AppResult<SearchScope> {
        for record_type in record_types {
            if !INDEXED_RECORD_TYPES.contains(record_type) {
                return Err(AppError::Validation(format!(
                    "record type '{record_type}' is not indexed for search"
                )));
            }
        }

        if record_types.len() > 1 {
            return Err(AppError::Validation(
                "a scoped search cannot span more than one indexed record type".to_owned(),
            ));
        }

        let Some(record_type) = record_types.first() else {
            return Ok(SearchScope::Unrestricted);
        };

        if scope.is_background() || scope.is_superuser() {
            return Ok(SearchScope::Unrestricted);
        }

        let rule = GatingRule::LocationBasis {
            record_type: *record_type,
        };
        if self.config.is_rule_disabled(&rule).await? {
            return Ok(SearchScope::Unrestricted);
        }

        let Some(principal) = scope.principal() else {
            return Ok(SearchScope::OwnerIds(sentinel_guarded(BTreeSet::new())));
        };

        if self.config.is_rule_bypassed_by(&rule, principal) {
            return Ok(SearchScope::Unrestricted);
        }

        let owners = self
            .resolver
            .accessible_record_owner_ids(principal, BasisType::Location)
            .await?;

        Ok(SearchScope::OwnerIds(sentinel_guarded(owners)))
    }
}
