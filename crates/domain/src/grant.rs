use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use medrova_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of entity that access is granted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasisType {
    /// A physical or organizational location; hierarchical.
    Location,
    /// A care program; flat.
    Program,
}

impl BasisType {
    /// Returns a stable storage value for this basis type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::Program => "program",
        }
    }

    /// Returns whether bases of this type form a hierarchy.
    #[must_use]
    pub fn is_hierarchical(&self) -> bool {
        matches!(self, Self::Location)
    }

    /// Returns all known basis types.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[BasisType] = &[BasisType::Location, BasisType::Program];

        ALL
    }
}

impl FromStr for BasisType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "location" => Ok(Self::Location),
            "program" => Ok(Self::Program),
            _ => Err(AppError::Validation(format!(
                "unknown basis type '{value}'"
            ))),
        }
    }
}

impl Display for BasisType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

/// Kind of principal that receives a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GranteeType {
    /// An individual user account.
    User,
    /// A named role shared by many users.
    Role,
}

impl GranteeType {
    /// Returns a stable storage value for this grantee type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Role => "role",
        }
    }
}

impl FromStr for GranteeType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "role" => Ok(Self::Role),
            _ => Err(AppError::Validation(format!(
                "unknown grantee type '{value}'"
            ))),
        }
    }
}

impl Display for GranteeType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

/// Identity of a grant, case-folded so lookups match regardless of the
/// casing identifiers were stored or queried with.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GrantKey {
    grantee_id: String,
    grantee_type: GranteeType,
    basis_id: String,
    basis_type: BasisType,
}

impl GrantKey {
    /// Creates a normalized grant key.
    pub fn new(
        grantee_id: impl AsRef<str>,
        grantee_type: GranteeType,
        basis_id: impl AsRef<str>,
        basis_type: BasisType,
    ) -> AppResult<Self> {
        let grantee_id = NonEmptyString::new(grantee_id.as_ref())?;
        let basis_id = NonEmptyString::new(basis_id.as_ref())?;

        Ok(Self {
            grantee_id: grantee_id.as_str().to_ascii_lowercase(),
            grantee_type,
            basis_id: basis_id.as_str().to_ascii_lowercase(),
            basis_type,
        })
    }

    /// Returns the case-folded grantee identifier.
    #[must_use]
    pub fn grantee_id(&self) -> &str {
        self.grantee_id.as_str()
    }

    /// Returns the grantee type.
    #[must_use]
    pub fn grantee_type(&self) -> GranteeType {
        self.grantee_type
    }

    /// Returns the case-folded basis identifier.
    #[must_use]
    pub fn basis_id(&self) -> &str {
        self.basis_id.as_str()
    }

    /// Returns the basis type.
    #[must_use]
    pub fn basis_type(&self) -> BasisType {
        self.basis_type
    }
}

/// A persisted access grant from a principal to a basis.
///
/// Grants are append/delete only: identifying fields are never mutated in
/// place. Uniqueness holds on the case-folded [`GrantKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    grant_id: Uuid,
    grantee_id: String,
    grantee_type: GranteeType,
    basis_id: String,
    basis_type: BasisType,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl AccessGrant {
    /// Creates a grant with a fresh surrogate identifier.
    pub fn new(
        grantee_id: impl Into<String>,
        grantee_type: GranteeType,
        basis_id: impl Into<String>,
        basis_type: BasisType,
        created_by: impl Into<String>,
    ) -> AppResult<Self> {
        Self::from_parts(
            Uuid::new_v4(),
            grantee_id,
            grantee_type,
            basis_id,
            basis_type,
            created_by,
            Utc::now(),
        )
    }

    /// Reconstructs a grant from persisted parts.
    pub fn from_parts(
        grant_id: Uuid,
        grantee_id: impl Into<String>,
        grantee_type: GranteeType,
        basis_id: impl Into<String>,
        basis_type: BasisType,
        created_by: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        let grantee_id: String = NonEmptyString::new(grantee_id)?.into();
        let basis_id: String = NonEmptyString::new(basis_id)?.into();

        Ok(Self {
            grant_id,
            grantee_id,
            grantee_type,
            basis_id,
            basis_type,
            created_by: created_by.into(),
            created_at,
        })
    }

    /// Returns the surrogate grant identifier.
    #[must_use]
    pub fn grant_id(&self) -> Uuid {
        self.grant_id
    }

    /// Returns the grantee identifier as stored.
    #[must_use]
    pub fn grantee_id(&self) -> &str {
        self.grantee_id.as_str()
    }

    /// Returns the grantee type.
    #[must_use]
    pub fn grantee_type(&self) -> GranteeType {
        self.grantee_type
    }

    /// Returns the basis identifier as stored.
    #[must_use]
    pub fn basis_id(&self) -> &str {
        self.basis_id.as_str()
    }

    /// Returns the basis type.
    #[must_use]
    pub fn basis_type(&self) -> BasisType {
        self.basis_type
    }

    /// Returns the subject that created the grant.
    #[must_use]
    pub fn created_by(&self) -> &str {
        self.created_by.as_str()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the normalized identity key for this grant.
    pub fn key(&self) -> AppResult<GrantKey> {
        GrantKey::new(
            self.grantee_id.as_str(),
            self.grantee_type,
            self.basis_id.as_str(),
            self.basis_type,
        )
    }
}

/// Stable audit actions emitted by grant management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantAuditAction {
    /// Emitted when an access grant is created.
    AccessGrantCreated,
    /// Emitted when an access grant is revoked.
    AccessGrantRevoked,
}

impl GrantAuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessGrantCreated => "access.grant.created",
            Self::AccessGrantRevoked => "access.grant.revoked",
        }
    }
}
