use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Authenticated identity evaluated by the access engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    subject: String,
    display_name: String,
    roles: BTreeSet<String>,
    privileges: BTreeSet<String>,
    superuser: bool,
}

impl Principal {
    /// Creates a principal from authentication data.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        display_name: impl Into<String>,
        roles: BTreeSet<String>,
        privileges: BTreeSet<String>,
        superuser: bool,
    ) -> Self {
        Self {
            subject: subject.into(),
            display_name: display_name.into(),
            roles,
            privileges,
            superuser,
        }
    }

    /// Returns the stable subject identifier.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the display name for the principal.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the role names held by the principal.
    #[must_use]
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    /// Returns whether the principal holds the named privilege.
    #[must_use]
    pub fn has_privilege(&self, name: &str) -> bool {
        self.privileges.contains(name)
    }

    /// Returns the privilege names held by the principal.
    #[must_use]
    pub fn privileges(&self) -> &BTreeSet<String> {
        &self.privileges
    }

    /// Returns whether the principal is a superuser.
    #[must_use]
    pub fn is_superuser(&self) -> bool {
        self.superuser
    }
}

/// Execution scope of one logical unit of work.
///
/// Background scopes (daemon tasks, migrations, index rebuilds) run with no
/// interactive principal and are never gated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestScope {
    principal: Option<Principal>,
    background: bool,
}

impl RequestScope {
    /// Creates an interactive scope for an authenticated principal.
    #[must_use]
    pub fn interactive(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            background: false,
        }
    }

    /// Creates an interactive scope with no authenticated principal yet.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            principal: None,
            background: false,
        }
    }

    /// Creates a background scope for system execution.
    #[must_use]
    pub fn background() -> Self {
        Self {
            principal: None,
            background: true,
        }
    }

    /// Returns the principal bound to this scope, if any.
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Returns whether this scope is background/system execution.
    #[must_use]
    pub fn is_background(&self) -> bool {
        self.background
    }

    /// Returns whether the bound principal is a superuser.
    #[must_use]
    pub fn is_superuser(&self) -> bool {
        self.principal
            .as_ref()
            .map(Principal::is_superuser)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{Principal, RequestScope};

    fn principal(superuser: bool) -> Principal {
        Principal::new(
            "alice",
            "Alice",
            BTreeSet::new(),
            BTreeSet::from(["View Patients".to_owned()]),
            superuser,
        )
    }

    #[test]
    fn privilege_lookup_is_exact() {
        let principal = principal(false);
        assert!(principal.has_privilege("View Patients"));
        assert!(!principal.has_privilege("view patients"));
    }

    #[test]
    fn background_scope_has_no_principal() {
        let scope = RequestScope::background();
        assert!(scope.is_background());
        assert!(scope.principal().is_none());
        assert!(!scope.is_superuser());
    }

    #[test]
    fn interactive_scope_reports_superuser() {
        let scope = RequestScope::interactive(principal(true));
        assert!(!scope.is_background());
        assert!(scope.is_superuser());
    }
}
