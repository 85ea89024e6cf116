use std::sync::Arc;

use medrova_core::{AppError, AppResult, Principal};
use medrova_domain::{BasisType, GatingRule};

use crate::RuntimeConfigRepository;

/// Configuration key for the global strict-mode toggle.
pub const STRICT_MODE_KEY: &str = "row_access.strict";

/// Cross-cutting enforcement configuration.
///
/// Wraps the runtime-config port with the engine's key conventions:
/// per-filter disable flags, the global strict-mode toggle, and the
/// classification-attribute mapping each basis type needs before
/// location-style gating can function.
#[derive(Clone)]
pub struct EnforcementConfig {
    config: Arc<dyn RuntimeConfigRepository>,
}

impl EnforcementConfig {
    /// Creates the configuration gate over a runtime-config port.
    #[must_use]
    pub fn new(config: Arc<dyn RuntimeConfigRepository>) -> Self {
        Self { config }
    }

    /// Returns whether a rule's filter is disabled by configuration.
    pub async fn is_rule_disabled(&self, rule: &GatingRule) -> AppResult<bool> {
        let value = self.config.get(rule.disable_config_key().as_str()).await?;
        Ok(value
            .map(|value| value.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false))
    }

    /// Returns whether the principal holds the per-filter bypass privilege.
    #[must_use]
    pub fn is_rule_bypassed_by(&self, rule: &GatingRule, principal: &Principal) -> bool {
        principal.has_privilege(rule.bypass_privilege().as_str())
    }

    /// Returns the global strict-mode flag; enforcing when unset.
    pub async fn strict_mode(&self) -> AppResult<bool> {
        let value = self.config.get(STRICT_MODE_KEY).await?;
        Ok(value
            .map(|value| !value.trim().eq_ignore_ascii_case("false"))
            .unwrap_or(true))
    }

    /// Returns the config key mapping a basis type to its classification
    /// attribute.
    #[must_use]
    pub fn classification_attribute_key(basis_type: BasisType) -> String {
        format!("row_access.{basis_type}.person_attribute_type")
    }

    /// Returns the classification-attribute id configured for a basis type.
    ///
    /// Absence is a configuration error, not an allow and not a denial.
    pub async fn classification_attribute_id(&self, basis_type: BasisType) -> AppResult<i64> {
        let key = Self::classification_attribute_key(basis_type);
        let value = self.config.get(key.as_str()).await?.ok_or_else(|| {
            AppError::Configuration(format!(
                "no classification attribute configured under '{key}'"
            ))
        })?;

        value.trim().parse::<i64>().map_err(|_| {
            AppError::Configuration(format!(
                "'{key}' must hold a numeric attribute type id, got '{value}'"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};
    use std::sync::Arc;

    use async_trait::async_trait;
    use medrova_core::{AppError, AppResult, Principal};
    use medrova_domain::{BasisType, GatedRecordType, GatingRule};
    use tokio::sync::RwLock;

    use crate::RuntimeConfigRepository;

    use super::EnforcementConfig;

    #[derive(Default)]
    struct FakeConfigRepository {
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

    fn patient_rule() -> GatingRule {
        GatingRule::LocationBasis {
            record_type: GatedRecordType::Patient,
        }
    }

    #[tokio::test]
    async fn rules_are_enabled_by_default() {
        let config = EnforcementConfig::new(Arc::new(FakeConfigRepository::default()));
        let disabled = config.is_rule_disabled(&patient_rule()).await;
        assert!(disabled.is_ok());
        assert!(!disabled.unwrap_or(true));
    }

    #[tokio::test]
    async fn disable_flag_is_read_per_filter() {
        let repository = Arc::new(FakeConfigRepository::default());
        let set = repository
            .set("row_access.location.patient.disabled", "TRUE")
            .await;
        assert!(set.is_ok());

        let config = EnforcementConfig::new(repository);
        let disabled = config.is_rule_disabled(&patient_rule()).await;
        assert!(disabled.unwrap_or(false));

        let other = GatingRule::LocationBasis {
            record_type: GatedRecordType::Visit,
        };
        let other_disabled = config.is_rule_disabled(&other).await;
        assert!(!other_disabled.unwrap_or(true));
    }

    #[tokio::test]
    async fn strict_mode_defaults_to_enforcing() {
        let config = EnforcementConfig::new(Arc::new(FakeConfigRepository::default()));
        let strict = config.strict_mode().await;
        assert!(strict.unwrap_or(false));
    }

    #[tokio::test]
    async fn missing_attribute_mapping_is_a_configuration_error() {
        let config = EnforcementConfig::new(Arc::new(FakeConfigRepository::default()));
        let result = config.classification_attribute_id(BasisType::Location).await;
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[tokio::test]
    async fn attribute_mapping_parses_numeric_id() {
        let repository = Arc::new(FakeConfigRepository::default());
        let set = repository
            .set("row_access.location.person_attribute_type", "4")
            .await;
        assert!(set.is_ok());

        let config = EnforcementConfig::new(repository);
        let id = config.classification_attribute_id(BasisType::Location).await;
        assert_eq!(id.unwrap_or(-1), 4);
    }

    #[tokio::test]
    async fn bypass_privilege_skips_exactly_the_named_filter() {
        let config = EnforcementConfig::new(Arc::new(FakeConfigRepository::default()));
        let rule = patient_rule();
        let principal = Principal::new(
            "alice",
            "Alice",
            BTreeSet::new(),
            BTreeSet::from([rule.bypass_privilege()]),
            false,
        );

        assert!(config.is_rule_bypassed_by(&rule, &principal));

        let other = GatingRule::LocationBasis {
            record_type: GatedRecordType::Visit,
        };
        assert!(!config.is_rule_bypassed_by(&other, &principal));
    }
}
