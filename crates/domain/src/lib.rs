//! Domain entities and invariants for the Medrova access engine.

#![forbid(unsafe_code)]

mod filter;
mod gating;
mod grant;
mod record;

pub use filter::{
    FilterParameterSets, NO_MATCH_ID, PARAM_ATTRIBUTE_TYPE_ID, PARAM_BASIS_IDS,
    PARAM_GRANTED_ROLES, PARAM_RECORD_OWNER_IDS, PARAM_ROLES, ParameterValue, sentinel_guarded,
};
pub use gating::{GatingRegistry, GatingRule, GatingRuleKind};
pub use grant::{AccessGrant, BasisType, GrantAuditAction, GrantKey, GranteeType};
pub use record::{EncounterLink, EncounterTypeRef, GatedRecord, GatedRecordType, OwnerScope};
