use std::collections::BTreeSet;

use async_trait::async_trait;
use medrova_core::AppResult;
use medrova_domain::{AccessGrant, BasisType, GrantAuditAction, GrantKey, GranteeType};

/// Reference to a grantee used by the grant management API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GranteeRef {
    /// Grantee identifier.
    pub grantee_id: String,
    /// Grantee type.
    pub grantee_type: GranteeType,
}

/// Reference to a basis used by the grant management API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasisRef {
    /// Basis identifier.
    pub basis_id: String,
    /// Basis type.
    pub basis_type: BasisType,
}

/// Repository port for persisted access grants.
///
/// All lookups are case-insensitive on identifier values; adapters compare
/// against the case-folded [`GrantKey`] form.
#[async_trait]
pub trait GrantRepository: Send + Sync {
    /// Persists a grant; duplicate identity is a conflict.
    async fn save(&self, grant: AccessGrant) -> AppResult<AccessGrant>;

    /// Deletes the grant with the given identity; absence is not-found.
    async fn delete(&self, key: &GrantKey) -> AppResult<()>;

    /// Finds a single grant by identity.
    async fn find(&self, key: &GrantKey) -> AppResult<Option<AccessGrant>>;

    /// Lists grants held by one grantee against one basis type.
    async fn find_all(
        &self,
        grantee_id: &str,
        grantee_type: GranteeType,
        basis_type: BasisType,
    ) -> AppResult<Vec<AccessGrant>>;

    /// Lists grants of one grantee type against one concrete basis.
    async fn find_by_basis(
        &self,
        grantee_type: GranteeType,
        basis_type: BasisType,
        basis_id: &str,
    ) -> AppResult<Vec<AccessGrant>>;

    /// Returns the distinct role names holding any grant for a basis type.
    async fn role_grantee_names(&self, basis_type: BasisType) -> AppResult<BTreeSet<String>>;
}

/// Port over the platform's hierarchical location service.
#[async_trait]
pub trait LocationHierarchy: Send + Sync {
    /// Returns all transitive descendant location ids, at every depth.
    async fn descendant_ids(
        &self,
        location_id: &str,
        include_self: bool,
    ) -> AppResult<Vec<String>>;
}

/// Port resolving classification attributes to record-owner identifiers.
#[async_trait]
pub trait PersonClassificationDirectory: Send + Sync {
    /// Returns the record-owner ids whose non-voided attribute of the given
    /// type matches any of the candidate values.
    async fn owner_ids_for_attribute(
        &self,
        attribute_type_id: i64,
        values: &BTreeSet<String>,
    ) -> AppResult<BTreeSet<String>>;
}

/// Port over the platform's encounter metadata.
#[async_trait]
pub trait EncounterDirectory: Send + Sync {
    /// Returns the encounter-type id of an encounter, if the encounter
    /// exists and carries a type.
    async fn encounter_type_of(&self, encounter_id: &str) -> AppResult<Option<String>>;

    /// Returns the privilege required to view encounters of a type, if the
    /// type is constrained at all.
    async fn view_privilege_of(&self, encounter_type_id: &str) -> AppResult<Option<String>>;
}

/// Port for runtime configuration values.
#[async_trait]
pub trait RuntimeConfigRepository: Send + Sync {
    /// Returns the configured value for a key, if set.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Sets the value for a key, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;
}

/// Immutable audit event payload emitted by grant management.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Subject that performed the action.
    pub subject: String,
    /// Stable audit action identifier.
    pub action: GrantAuditAction,
    /// Resource type label.
    pub resource_type: String,
    /// Resource identifier.
    pub resource_id: String,
    /// Optional audit detail payload.
    pub detail: Option<String>,
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
