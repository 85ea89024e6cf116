use std::collections::BTreeSet;
use std::sync::Arc;

use medrova_core::{AppResult, Principal};
use medrova_domain::{BasisType, GranteeType};
use tracing::debug;

use crate::{
    EncounterDirectory, EnforcementConfig, GrantRepository, LocationHierarchy,
    PersonClassificationDirectory,
};

/// Access sets resolved for one principal and basis type.
///
/// Ephemeral: computed per unit of work, never persisted. Both sets are the
/// honest resolution; sentinel substitution happens at parameter-building
/// call sites.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAccessSet {
    /// Assigned basis ids, hierarchically expanded.
    pub basis_ids: BTreeSet<String>,
    /// Record-owner ids reachable through the basis ids.
    pub record_owner_ids: BTreeSet<String>,
}

/// Expands grants into concrete accessible-identifier sets.
///
/// The resolver is the single source both enforcement mechanisms derive
/// from: query-level filter activation and the load-time safety net must
/// agree because they consume the same resolution.
#[derive(Clone)]
pub struct AccessResolver {
    grants: Arc<dyn GrantRepository>,
    locations: Arc<dyn LocationHierarchy>,
    classifications: Arc<dyn PersonClassificationDirectory>,
    encounters: Arc<dyn EncounterDirectory>,
    config: EnforcementConfig,
}

impl AccessResolver {
    /// Creates a resolver over the engine's ports.
    #[must_use]
    pub fn new(
        grants: Arc<dyn GrantRepository>,
        locations: Arc<dyn LocationHierarchy>,
        classifications: Arc<dyn PersonClassificationDirectory>,
        encounters: Arc<dyn EncounterDirectory>,
        config: EnforcementConfig,
    ) -> Self {
        Self {
            grants,
            locations,
            classifications,
            encounters,
            config,
        }
    }

    /// Returns the basis ids assigned to the principal for a basis type,
    /// transitively expanded for hierarchical bases.
    ///
    /// Returns the honest empty set when no grants exist; sentinel
    /// substitution belongs to call sites that need a non-empty containment
    /// parameter.
    pub async fn assigned_basis_ids(
        &self,
        principal: &Principal,
        basis_type: BasisType,
    ) -> AppResult<BTreeSet<String>> {
        let grants = self
            .grants
            .find_all(principal.subject(), GranteeType::User, basis_type)
            .await?;

        let mut basis_ids = BTreeSet::new();
        for grant in &grants {
            if basis_type.is_hierarchical() {
                let descendants = self.locations.descendant_ids(grant.basis_id(), true).await?;
                basis_ids.extend(descendants);
            } else {
                basis_ids.insert(grant.basis_id().to_owned());
            }
        }

        debug!(
            subject = principal.subject(),
            basis_type = basis_type.as_str(),
            count = basis_ids.len(),
            "resolved assigned basis ids"
        );

        Ok(basis_ids)
    }

    /// Resolves both access sets for a principal and basis type in one
    /// pass over the grant store.
    ///
    /// Fails with a configuration error when owner derivation is needed but
    /// no classification attribute is mapped for the basis type.
    pub async fn resolve_access_set(
        &self,
        principal: &Principal,
        basis_type: BasisType,
    ) -> AppResult<ResolvedAccessSet> {
        let basis_ids = self.assigned_basis_ids(principal, basis_type).await?;
        if basis_ids.is_empty() {
            return Ok(ResolvedAccessSet::default());
        }

        let attribute_type_id = self.config.classification_attribute_id(basis_type).await?;
        let record_owner_ids = self
            .classifications
            .owner_ids_for_attribute(attribute_type_id, &basis_ids)
            .await?;

        Ok(ResolvedAccessSet {
            basis_ids,
            record_owner_ids,
        })
    }

    /// Returns the record-owner ids reachable through the principal's
    /// grants for a basis type.
    ///
    /// Fails with a configuration error when no classification attribute is
    /// mapped for the basis type.
    pub async fn accessible_record_owner_ids(
        &self,
        principal: &Principal,
        basis_type: BasisType,
    ) -> AppResult<BTreeSet<String>> {
        Ok(self
            .resolve_access_set(principal, basis_type)
            .await?
            .record_owner_ids)
    }

    /// Returns the privilege required to view an encounter type, if any.
    pub async fn view_privilege_for(
        &self,
        encounter_type_id: &str,
    ) -> AppResult<Option<String>> {
        self.encounters.view_privilege_of(encounter_type_id).await
    }

    /// Returns the role names holding any grant against a basis type.
    pub async fn role_based_basis_role_names(
        &self,
        basis_type: BasisType,
    ) -> AppResult<BTreeSet<String>> {
        self.grants.role_grantee_names(basis_type).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use medrova_core::AppError;
    use medrova_domain::{AccessGrant, BasisType, GranteeType};

    use crate::{EnforcementConfig, GrantRepository, RuntimeConfigRepository};
    use crate::test_support::{
        FakeClassificationDirectory, FakeConfigRepository, FakeEncounterDirectory,
        FakeGrantRepository, FakeLocationHierarchy, grant, principal,
    };

    use super::AccessResolver;

    struct Fixture {
        grants: Arc<FakeGrantRepository>,
        locations: Arc<FakeLocationHierarchy>,
        classifications: Arc<FakeClassificationDirectory>,
        config_repository: Arc<FakeConfigRepository>,
        resolver: AccessResolver,
    }

    fn fixture() -> Fixture {
        let grants = Arc::new(FakeGrantRepository::default());
        let locations = Arc::new(FakeLocationHierarchy::default());
        let classifications = Arc::new(FakeClassificationDirectory::default());
        let encounters = Arc::new(FakeEncounterDirectory::default());
        let config_repository = Arc::new(FakeConfigRepository::default());
        let resolver = AccessResolver::new(
            grants.clone(),
            locations.clone(),
            classifications.clone(),
            encounters,
            EnforcementConfig::new(config_repository.clone()),
        );

        Fixture {
            grants,
            locations,
            classifications,
            config_repository,
            resolver,
        }
    }

    #[tokio::test]
    async fn no_grants_resolve_to_empty_sets() {
        let fixture = fixture();
        let assigned = fixture
            .resolver
            .assigned_basis_ids(&principal("alice"), BasisType::Location)
            .await;
        assert!(assigned.is_ok());
        assert!(assigned.unwrap_or_default().is_empty());

        let owners = fixture
            .resolver
            .accessible_record_owner_ids(&principal("alice"), BasisType::Location)
            .await;
        assert!(owners.is_ok());
        assert!(owners.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn location_grant_expands_to_transitive_descendants() {
        let fixture = fixture();
        fixture
            .grants
            .seed(grant("alice", "L1", BasisType::Location))
            .await;
        fixture.locations.link("L1", "L2").await;
        fixture.locations.link("L2", "L3").await;

        let assigned = fixture
            .resolver
            .assigned_basis_ids(&principal("alice"), BasisType::Location)
            .await;
        assert_eq!(
            assigned.unwrap_or_default(),
            BTreeSet::from(["L1".to_owned(), "L2".to_owned(), "L3".to_owned()])
        );
    }

    #[tokio::test]
    async fn program_grants_do_not_expand() {
        let fixture = fixture();
        fixture
            .grants
            .seed(grant("alice", "prog-1", BasisType::Program))
            .await;

        let assigned = fixture
            .resolver
            .assigned_basis_ids(&principal("alice"), BasisType::Program)
            .await;
        assert_eq!(
            assigned.unwrap_or_default(),
            BTreeSet::from(["prog-1".to_owned()])
        );
    }

    #[tokio::test]
    async fn owner_ids_resolve_through_classification_attribute() {
        let fixture = fixture();
        fixture
            .grants
            .seed(grant("alice", "L1", BasisType::Location))
            .await;
        fixture.locations.link("L1", "L2").await;
        let configured = fixture
            .config_repository
            .set("row_access.location.person_attribute_type", "4")
            .await;
        assert!(configured.is_ok());

        fixture.classifications.classify(4, "p-child", "L2").await;
        fixture.classifications.classify(4, "p-other", "L9").await;
        fixture.classifications.classify(7, "p-wrong-attr", "L2").await;

        let owners = fixture
            .resolver
            .accessible_record_owner_ids(&principal("alice"), BasisType::Location)
            .await;
        assert_eq!(
            owners.unwrap_or_default(),
            BTreeSet::from(["p-child".to_owned()])
        );
    }

    #[tokio::test]
    async fn missing_attribute_mapping_propagates_configuration_error() {
        let fixture = fixture();
        fixture
            .grants
            .seed(grant("alice", "L1", BasisType::Location))
            .await;

        let owners = fixture
            .resolver
            .accessible_record_owner_ids(&principal("alice"), BasisType::Location)
            .await;
        assert!(matches!(owners, Err(AppError::Configuration(_))));
    }

    #[tokio::test]
    async fn grant_then_revoke_restores_the_resolved_set() {
        let fixture = fixture();
        let before = fixture
            .resolver
            .assigned_basis_ids(&principal("alice"), BasisType::Location)
            .await
            .unwrap_or_default();

        let granted = grant("alice", "L1", BasisType::Location);
        let key = granted.key();
        assert!(key.is_ok());
        fixture.grants.seed(granted).await;

        let during = fixture
            .resolver
            .assigned_basis_ids(&principal("alice"), BasisType::Location)
            .await
            .unwrap_or_default();
        assert_eq!(during, BTreeSet::from(["L1".to_owned()]));

        if let Ok(key) = key {
            let deleted = fixture.grants.delete(&key).await;
            assert!(deleted.is_ok());
        }

        let after = fixture
            .resolver
            .assigned_basis_ids(&principal("alice"), BasisType::Location)
            .await
            .unwrap_or_default();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn role_grants_surface_as_role_based_basis_names() {
        let fixture = fixture();
        let role_grant = AccessGrant::new(
            "Chemo Nurses",
            GranteeType::Role,
            "prog-1",
            BasisType::Program,
            "admin",
        );
        assert!(role_grant.is_ok());
        if let Ok(role_grant) = role_grant {
            fixture.grants.seed(role_grant).await;
        }

        let names = fixture
            .resolver
            .role_based_basis_role_names(BasisType::Program)
            .await;
        assert_eq!(
            names.unwrap_or_default(),
            BTreeSet::from(["Chemo Nurses".to_owned()])
        );
    }
}
