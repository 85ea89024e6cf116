use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// The single agreed "matches nothing" identifier.
///
/// All real record and basis identifiers are positive, so substituting
/// `{"-1"}` for an empty access set makes every containment predicate
/// deterministically false while keeping the parameter set non-empty (an
/// empty `IN ()` list is not representable in the predicate layer).
pub const NO_MATCH_ID: &str = "-1";

/// Parameter name: classification attribute type identifier.
pub const PARAM_ATTRIBUTE_TYPE_ID: &str = "attribute_type_id";
/// Parameter name: accessible basis identifiers.
pub const PARAM_BASIS_IDS: &str = "basis_ids";
/// Parameter name: accessible record-owner identifiers.
pub const PARAM_RECORD_OWNER_IDS: &str = "record_owner_ids";
/// Parameter name: role or privilege names held by the principal.
pub const PARAM_ROLES: &str = "roles";
/// Parameter name: every role name holding any grant for the basis type.
pub const PARAM_GRANTED_ROLES: &str = "granted_roles";

/// Returns the set itself, or the sentinel set when it is empty.
#[must_use]
pub fn sentinel_guarded(ids: BTreeSet<String>) -> BTreeSet<String> {
    if ids.is_empty() {
        BTreeSet::from([NO_MATCH_ID.to_owned()])
    } else {
        ids
    }
}

/// One value bound into a query-level filter parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterValue {
    /// Integer parameter.
    Int(i64),
    /// String parameter.
    Str(String),
    /// Set-of-strings parameter for containment predicates.
    StrSet(BTreeSet<String>),
}

/// Named parameter sets produced once per unit of work and consumed by the
/// persistence layer's predicate injection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParameterSets {
    filters: BTreeMap<String, BTreeMap<String, ParameterValue>>,
}

impl FilterParameterSets {
    /// Creates an empty parameter collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds one parameter under a filter name.
    pub fn set(
        &mut self,
        filter: impl Into<String>,
        parameter: impl Into<String>,
        value: ParameterValue,
    ) {
        self.filters
            .entry(filter.into())
            .or_default()
            .insert(parameter.into(), value);
    }

    /// Returns one bound parameter, if present.
    #[must_use]
    pub fn get(&self, filter: &str, parameter: &str) -> Option<&ParameterValue> {
        self.filters
            .get(filter)
            .and_then(|parameters| parameters.get(parameter))
    }

    /// Returns the names of filters with at least one bound parameter.
    #[must_use]
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.keys().map(String::as_str).collect()
    }

    /// Returns whether no parameters are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Removes every bound parameter.
    pub fn clear(&mut self) {
        self.filters.clear();
    }
}
