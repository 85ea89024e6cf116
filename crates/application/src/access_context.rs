use medrova_core::RequestScope;
use medrova_domain::FilterParameterSets;

/// Activation protocol states for one unit of work.
///
/// `Activating` is the structural recursion guard: resolution issues its own
/// lookups, and any nested activation attempt observes the interim state and
/// returns instead of re-entering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationState {
    /// No parameters resolved; filters must not be trusted.
    #[default]
    Inactive,
    /// Resolution in progress; nested activation is a no-op.
    Activating,
    /// Parameters resolved; query-level predicates may consume them.
    Active,
}

/// Mutable enforcement state owned by one logical unit of work.
///
/// Created at the start of a request or transaction, passed by reference
/// through the call chain, never shared across concurrent units of work.
/// Reusing a context for a different principal without
/// [`AccessContext::reset`] is a correctness bug.
#[derive(Debug, Clone)]
pub struct AccessContext {
    scope: RequestScope,
    state: ActivationState,
    parameters: FilterParameterSets,
}

impl AccessContext {
    /// Creates an inactive context for a request scope.
    #[must_use]
    pub fn new(scope: RequestScope) -> Self {
        Self {
            scope,
            state: ActivationState::Inactive,
            parameters: FilterParameterSets::new(),
        }
    }

    /// Returns the request scope the context was created for.
    #[must_use]
    pub fn scope(&self) -> &RequestScope {
        &self.scope
    }

    /// Returns the current activation state.
    #[must_use]
    pub fn state(&self) -> ActivationState {
        self.state
    }

    /// Returns the resolved parameter sets.
    ///
    /// Meaningful only in the `Active` state; callers consuming parameters
    /// before activation completes would read a partial resolution.
    #[must_use]
    pub fn parameters(&self) -> &FilterParameterSets {
        &self.parameters
    }

    /// Enters the `Activating` state.
    ///
    /// Returns `false` without touching state when activation is already in
    /// progress or complete, which makes the caller's short-circuit
    /// idempotent.
    pub(crate) fn begin_activation(&mut self) -> bool {
        if self.state != ActivationState::Inactive {
            return false;
        }

        self.state = ActivationState::Activating;
        true
    }

    /// Completes activation with the resolved parameters.
    pub(crate) fn complete_activation(&mut self, parameters: FilterParameterSets) {
        self.parameters = parameters;
        self.state = ActivationState::Active;
    }

    /// Returns the context to `Inactive` and clears resolved parameters.
    ///
    /// Must be invoked after every grant mutation (the resolution is stale)
    /// and at the end of the unit of work.
    pub fn reset(&mut self) {
        self.parameters.clear();
        self.state = ActivationState::Inactive;
    }
}

#[cfg(test)]
mod tests {
    use medrova_core::RequestScope;
    use medrova_domain::{FilterParameterSets, ParameterValue};

    use super::{AccessContext, ActivationState};

    #[test]
    fn begin_activation_is_single_entry() {
        let mut context = AccessContext::new(RequestScope::background());
        assert!(context.begin_activation());
        assert_eq!(context.state(), ActivationState::Activating);
        assert!(!context.begin_activation());
    }

    #[test]
    fn complete_then_reset_round_trips() {
        let mut context = AccessContext::new(RequestScope::background());
        assert!(context.begin_activation());

        let mut parameters = FilterParameterSets::new();
        parameters.set("f", "p", ParameterValue::Int(1));
        context.complete_activation(parameters);
        assert_eq!(context.state(), ActivationState::Active);
        assert!(!context.parameters().is_empty());

        context.reset();
        assert_eq!(context.state(), ActivationState::Inactive);
        assert!(context.parameters().is_empty());
    }

    #[test]
    fn active_context_rejects_re_entry() {
        let mut context = AccessContext::new(RequestScope::background());
        assert!(context.begin_activation());
        context.complete_activation(FilterParameterSets::new());
        assert!(!context.begin_activation());
    }
}
