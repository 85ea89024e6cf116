//! Application services and ports for the Medrova access engine.

#![forbid(unsafe_code)]

mod access_context;
mod access_ports;
mod access_resolver;
mod enforcement_config;
mod filter_activation;
mod grant_service;
mod load_guard;
mod search_filter;
#[cfg(test)]
mod test_support;

pub use access_context::{AccessContext, ActivationState};
pub use access_ports::{
    AuditEvent, AuditRepository, BasisRef, EncounterDirectory, GrantRepository, GranteeRef,
    LocationHierarchy, PersonClassificationDirectory, RuntimeConfigRepository,
};
pub use access_resolver::{AccessResolver, ResolvedAccessSet};
pub use enforcement_config::{EnforcementConfig, STRICT_MODE_KEY};
pub use filter_activation::FilterActivationService;
pub use grant_service::GrantAccessService;
pub use load_guard::LoadTimeGuard;
pub use search_filter::{SearchFilterAdapter, SearchScope};
