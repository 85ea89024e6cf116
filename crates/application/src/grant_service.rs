use std::sync::Arc;

use medrova_core::{AppError, AppResult, RequestScope};
use medrova_domain::{AccessGrant, BasisType, GrantAuditAction, GrantKey, GranteeType};
use tracing::info;

use crate::{AccessContext, AuditEvent, AuditRepository, BasisRef, GrantRepository, GranteeRef};

/// Grant management API consumed by administrative tooling and by the
/// engine itself.
///
/// Every mutation appends an audit event and resets the caller's
/// [`AccessContext`]: the resolved parameter sets are stale the moment a
/// grant changes, and the next activation must observe committed state.
#[derive(Clone)]
pub struct GrantAccessService {
    grants: Arc<dyn GrantRepository>,
    audit: Arc<dyn AuditRepository>,
}

impl GrantAccessService {
    /// Creates the service.
    #[must_use]
    pub fn new(grants: Arc<dyn GrantRepository>, audit: Arc<dyn AuditRepository>) -> Self {
        Self { grants, audit }
    }

    /// Grants a basis to a grantee.
    pub async fn grant_access(
        &self,
        scope: &RequestScope,
        context: &mut AccessContext,
        grantee: &GranteeRef,
        basis: &BasisRef,
    ) -> AppResult<AccessGrant> {
        let grant = AccessGrant::new(
            grantee.grantee_id.as_str(),
            grantee.grantee_type,
            basis.basis_id.as_str(),
            basis.basis_type,
            Self::subject_of(scope),
        )?;
        let saved = self.grants.save(grant).await?;

        self.append_audit(scope, GrantAuditAction::AccessGrantCreated, &saved)
            .await?;
        context.reset();

        info!(
            grantee = saved.grantee_id(),
            basis = saved.basis_id(),
            basis_type = saved.basis_type().as_str(),
            "access granted"
        );

        Ok(saved)
    }

    /// Grants several bases to a grantee.
    pub async fn grant_access_all(
        &self,
        scope: &RequestScope,
        context: &mut AccessContext,
        grantee: &GranteeRef,
        bases: &[BasisRef],
    ) -> AppResult<Vec<AccessGrant>> {
        let mut granted = Vec::with_capacity(bases.len());
        for basis in bases {
            granted.push(self.grant_access(scope, context, grantee, basis).await?);
        }

        Ok(granted)
    }

    /// Revokes a basis from a grantee.
    pub async fn revoke_access(
        &self,
        scope: &RequestScope,
        context: &mut AccessContext,
        grantee: &GranteeRef,
        basis: &BasisRef,
    ) -> AppResult<()> {
        let key = Self::key_of(grantee, basis)?;
        let existing = self.grants.find(&key).await?.ok_or_else(|| {
            AppError::NotFound(format!(
                "no grant from {} '{}' to {} '{}'",
                grantee.grantee_type, grantee.grantee_id, basis.basis_type, basis.basis_id
            ))
        })?;

        self.grants.delete(&key).await?;
        self.append_audit(scope, GrantAuditAction::AccessGrantRevoked, &existing)
            .await?;
        context.reset();

        info!(
            grantee = existing.grantee_id(),
            basis = existing.basis_id(),
            basis_type = existing.basis_type().as_str(),
            "access revoked"
        );

        Ok(())
    }

    /// Revokes several bases from a grantee.
    pub async fn revoke_access_all(
        &self,
        scope: &RequestScope,
        context: &mut AccessContext,
        grantee: &GranteeRef,
        bases: &[BasisRef],
    ) -> AppResult<()> {
        for basis in bases {
            self.revoke_access(scope, context, grantee, basis).await?;
        }

        Ok(())
    }

    /// Returns whether a grant currently exists.
    pub async fn has_access(&self, grantee: &GranteeRef, basis: &BasisRef) -> AppResult<bool> {
        let key = Self::key_of(grantee, basis)?;
        Ok(self.grants.find(&key).await?.is_some())
    }

    /// Lists the grants a grantee holds against a basis type.
    pub async fn list_grants(
        &self,
        grantee: &GranteeRef,
        basis_type: BasisType,
    ) -> AppResult<Vec<AccessGrant>> {
        self.grants
            .find_all(grantee.grantee_id.as_str(), grantee.grantee_type, basis_type)
            .await
    }

    /// Lists the grants of one grantee type against a concrete basis.
    pub async fn list_grantees_for_basis(
        &self,
        grantee_type: GranteeType,
        basis: &BasisRef,
    ) -> AppResult<Vec<AccessGrant>> {
        self.grants
            .find_by_basis(grantee_type, basis.basis_type, basis.basis_id.as_str())
            .await
    }

    fn subject_of(scope: &RequestScope) -> String {
        scope
            .principal()
            .map(|principal| principal.subject().to_owned())
            .unwrap_or_else(|| "system".to_owned())
    }

    fn key_of(grantee: &GranteeRef, basis: &BasisRef) -> AppResult<GrantKey> {
        GrantKey::new(
            grantee.grantee_id.as_str(),
            grantee.grantee_type,
            basis.basis_id.as_str(),
            basis.basis_type,
        )
    }

    async fn append_audit(
        &self,
        scope: &RequestScope,
        action: GrantAuditAction,
        grant: &AccessGrant,
    ) -> AppResult<()> {
        self.audit
            .append_event(AuditEvent {
                subject: Self::subject_of(scope),
                action,
                resource_type: "access_grant".to_owned(),
                resource_id: grant.grant_id().to_string(),
                detail: Some(format!(
                    "{} '{}' on {} '{}'",
                    grant.grantee_type(),
                    grant.grantee_id(),
                    grant.basis_type(),
                    grant.basis_id()
                )),
            })
            .await
    }
}
