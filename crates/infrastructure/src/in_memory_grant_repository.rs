use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use medrova_application::GrantRepository;
use medrova_core::{AppError, AppResult};
use medrova_domain::{AccessGrant, BasisType, GrantKey, GranteeType};
use tokio::sync::RwLock;

/// In-memory grant repository implementation.
///
/// Keyed by the case-folded [`GrantKey`], so lookups are case-insensitive
/// exactly like the PostgreSQL adapter.
#[derive(Debug, Default)]
pub struct InMemoryGrantRepository {
    grants: RwLock<HashMap<GrantKey, AccessGrant>>,
}

impl InMemoryGrantRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grants: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl GrantRepository for InMemoryGrantRepository {
    async fn save(&self, grant: AccessGrant) -> AppResult<AccessGrant> {
        let key = grant.key()?;
        let mut grants = self.grants.write().await;

        if grants.contains_key(&key) {
            return Err(AppError::Conflict(format!(
                "grant from {} '{}' to {} '{}' already exists",
                grant.grantee_type(),
                grant.grantee_id(),
                grant.basis_type(),
                grant.basis_id()
            )));
        }

        grants.insert(key, grant.clone());
        Ok(grant)
    }

    async fn delete(&self, key: &GrantKey) -> AppResult<()> {
        if self.grants.write().await.remove(key).is_none() {
            return Err(AppError::NotFound(format!(
                "no grant from {} '{}' to {} '{}'",
                key.grantee_type(),
                key.grantee_id(),
                key.basis_type(),
                key.basis_id()
            )));
        }

        Ok(())
    }

    async fn find(&self, key: &GrantKey) -> AppResult<Option<AccessGrant>> {
        Ok(self.grants.read().await.get(key).cloned())
    }

    async fn find_all(
        &self,
        grantee_id: &str,
        grantee_type: GranteeType,
        basis_type: BasisType,
    ) -> AppResult<Vec<AccessGrant>> {
        let folded = grantee_id.to_ascii_lowercase();
        let grants = self.grants.read().await;

        let mut listed: Vec<AccessGrant> = grants
            .iter()
            .filter_map(|(key, grant)| {
                (key.grantee_id() == folded
                    && key.grantee_type() == grantee_type
                    && key.basis_type() == basis_type)
                    .then_some(grant.clone())
            })
            .collect();
        listed.sort_by(|left, right| left.basis_id().cmp(right.basis_id()));

        Ok(listed)
    }

    async fn find_by_basis(
        &self,
        grantee_type: GranteeType,
        basis_type: BasisType,
        basis_id: &str,
    ) -> AppResult<Vec<AccessGrant>> {
        let folded = basis_id.to_ascii_lowercase();
        let grants = self.grants.read().await;

        let mut listed: Vec<AccessGrant> = grants
            .iter()
            .filter_map(|(key, grant)| {
                (key.basis_id() == folded
                    && key.grantee_type() == grantee_type
                    && key.basis_type() == basis_type)
                    .then_some(grant.clone())
            })
            .collect();
        listed.sort_by(|left, right| left.grantee_id().cmp(right.grantee_id()));

        Ok(listed)
    }

    async fn role_grantee_names(&self, basis_type: BasisType) -> AppResult<BTreeSet<String>> {
        Ok(self
            .grants
            .read()
            .await
            .iter()
            .filter_map(|(key, grant)| {
                (key.grantee_type() == GranteeType::Role && key.basis_type() == basis_type)
                    .then(|| grant.grantee_id().to_owned())
            })
            .collect())
    }
}
