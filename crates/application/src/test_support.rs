//! Shared fake ports for service tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use medrova_core::{AppError, AppResult, Principal};
use medrova_domain::{AccessGrant, BasisType, GrantKey, GranteeType};
use tokio::sync::RwLock;

use crate::{
    AuditEvent, AuditRepository, EncounterDirectory, GrantRepository, LocationHierarchy,
    PersonClassificationDirectory, RuntimeConfigRepository,
};

/// In-memory grant fake that counts lookups, so activation idempotence can
/// be asserted by counting resolver-driven port invocations.
#[derive(Default)]
pub(crate) struct FakeGrantRepository {
    grants: RwLock<Vec<AccessGrant>>,
    find_all_calls: AtomicUsize,
}

impl FakeGrantRepository {
    pub(crate) async fn seed(&self, grant: AccessGrant) {
        self.grants.write().await.push(grant);
    }

    pub(crate) fn find_all_calls(&self) -> usize {
        self.find_all_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GrantRepository for FakeGrantRepository {
    async fn save(&self, grant: AccessGrant) -> AppResult<AccessGrant> {
        let key = grant.key()?;
        if self.find(&key).await?.is_some() {
            return Err(AppError::Conflict("duplicate grant".to_owned()));
        }

        self.grants.write().await.push(grant.clone());
        Ok(grant)
    }

    async fn delete(&self, key: &GrantKey) -> AppResult<()> {
        let mut grants = self.grants.write().await;
        let before = grants.len();
        grants.retain(|grant| grant.key().ok().as_ref() != Some(key));
        if grants.len() == before {
            return Err(AppError::NotFound("no such grant".to_owned()));
        }

        Ok(())
    }

    async fn find(&self, key: &GrantKey) -> AppResult<Option<AccessGrant>> {
        Ok(self
            .grants
            .read()
            .await
            .iter()
            .find(|grant| grant.key().ok().as_ref() == Some(key))
            .cloned())
    }

    async fn find_all(
        &self,
        grantee_id: &str,
        grantee_type: GranteeType,
        basis_type: BasisType,
    ) -> AppResult<Vec<AccessGrant>> {
        self.find_all_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .grants
            .read()
            .await
            .iter()
            .filter(|grant| {
                grant.grantee_id().eq_ignore_ascii_case(grantee_id)
                    && grant.grantee_type() == grantee_type
                    && grant.basis_type() == basis_type
            })
            .cloned()
            .collect())
    }

    async fn find_by_basis(
        &self,
        grantee_type: GranteeType,
        basis_type: BasisType,
        basis_id: &str,
    ) -> AppResult<Vec<AccessGrant>> {
        Ok(self
            .grants
            .read()
            .await
            .iter()
            .filter(|grant| {
                grant.grantee_type() == grantee_type
                    && grant.basis_type() == basis_type
                    && grant.basis_id().eq_ignore_ascii_case(basis_id)
            })
            .cloned()
            .collect())
    }

    async fn role_grantee_names(&self, basis_type: BasisType) -> AppResult<BTreeSet<String>> {
        Ok(self
            .grants
            .read()
            .await
            .iter()
            .filter(|grant| {
                grant.grantee_type() == GranteeType::Role && grant.basis_type() == basis_type
            })
            .map(|grant| grant.grantee_id().to_owned())
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct FakeLocationHierarchy {
    children: RwLock<HashMap<String, Vec<String>>>,
}

impl FakeLocationHierarchy {
    pub(crate) async fn link(&self, parent: &str, child: &str) {
        self.children
            .write()
            .await
            .entry(parent.to_owned())
            .or_default()
            .push(child.to_owned());
    }
}

#[async_trait]
impl LocationHierarchy for FakeLocationHierarchy {
    async fn descendant_ids(
        &self,
        location_id: &str,
        include_self: bool,
    ) -> AppResult<Vec<String>> {
        let children = self.children.read().await;
        let mut collected = Vec::new();
        if include_self {
            collected.push(location_id.to_owned());
        }

        let mut frontier = vec![location_id.to_owned()];
        while let Some(current) = frontier.pop() {
            for child in children.get(&current).into_iter().flatten() {
                collected.push(child.clone());
                frontier.push(child.clone());
            }
        }

        Ok(collected)
    }
}

#[derive(Default)]
pub(crate) struct FakeClassificationDirectory {
    links: RwLock<Vec<(i64, String, String)>>,
}

impl FakeClassificationDirectory {
    pub(crate) async fn classify(&self, attribute_type_id: i64, owner: &str, value: &str) {
        self.links
            .write()
            .await
            .push((attribute_type_id, owner.to_owned(), value.to_owned()));
    }
}

#[async_trait]
impl PersonClassificationDirectory for FakeClassificationDirectory {
    async fn owner_ids_for_attribute(
        &self,
        attribute_type_id: i64,
        values: &BTreeSet<String>,
    ) -> AppResult<BTreeSet<String>> {
        Ok(self
            .links
            .read()
            .await
            .iter()
            .filter(|(stored_type, _, value)| {
                *stored_type == attribute_type_id && values.contains(value)
            })
            .map(|(_, owner, _)| owner.clone())
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct FakeEncounterDirectory {
    types: RwLock<HashMap<String, String>>,
    privileges: RwLock<HashMap<String, String>>,
}

impl FakeEncounterDirectory {
    pub(crate) async fn seed_encounter(&self, encounter_id: &str, type_id: &str) {
        self.types
            .write()
            .await
            .insert(encounter_id.to_owned(), type_id.to_owned());
    }

    pub(crate) async fn require_privilege(&self, type_id: &str, privilege: &str) {
        self.privileges
            .write()
            .await
            .insert(type_id.to_owned(), privilege.to_owned());
    }
}

#[async_trait]
impl EncounterDirectory for FakeEncounterDirectory {
    async fn encounter_type_of(&self, encounter_id: &str) -> AppResult<Option<String>> {
        Ok(self.types.read().await.get(encounter_id).cloned())
    }

    async fn view_privilege_of(&self, encounter_type_id: &str) -> AppResult<Option<String>> {
        Ok(self.privileges.read().await.get(encounter_type_id).cloned())
    }
}

#[derive(Default)]
pub(crate) struct FakeConfigRepository {
    values: RwLock<HashMap<String, String>>,
}

#[async_trait]
impl RuntimeConfigRepository for FakeConfigRepository {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.values
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    events: RwLock<Vec<AuditEvent>>,
}

impl FakeAuditRepository {
    pub(crate) async fn events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}

pub(crate) fn principal(subject: &str) -> Principal {
    Principal::new(subject, subject, BTreeSet::new(), BTreeSet::new(), false)
}

pub(crate) fn principal_with(
    subject: &str,
    roles: BTreeSet<String>,
    privileges: BTreeSet<String>,
) -> Principal {
    Principal::new(subject, subject, roles, privileges, false)
}

pub(crate) fn superuser(subject: &str) -> Principal {
    Principal::new(subject, subject, BTreeSet::new(), BTreeSet::new(), true)
}

pub(crate) fn grant(subject: &str, basis_id: &str, basis_type: BasisType) -> AccessGrant {
    AccessGrant::new(subject, GranteeType::User, basis_id, basis_type, "admin")
        .unwrap_or_else(|_| unreachable!())
}
