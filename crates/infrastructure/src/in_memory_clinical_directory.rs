use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use medrova_application::{EncounterDirectory, LocationHierarchy, PersonClassificationDirectory};
use medrova_core::AppResult;
use tokio::sync::RwLock;

/// One classification attribute row linking a person to a basis value.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ClassificationRow {
    attribute_type_id: i64,
    owner_id: String,
    value: String,
    voided: bool,
}

/// In-memory clinical directory implementation.
///
/// Backs the location hierarchy, person classification, and encounter
/// metadata ports for embedding tests and local tooling.
#[derive(Debug, Default)]
pub struct InMemoryClinicalDirectory {
    location_children: RwLock<HashMap<String, Vec<String>>>,
    classifications: RwLock<Vec<ClassificationRow>>,
    encounter_types: RwLock<HashMap<String, String>>,
    view_privileges: RwLock<HashMap<String, String>>,
}

impl InMemoryClinicalDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a parent-child location link.
    pub async fn add_location_child(&self, parent_id: &str, child_id: &str) {
        self.location_children
            .write()
            .await
            .entry(parent_id.to_owned())
            .or_default()
            .push(child_id.to_owned());
    }

    /// Records a classification attribute row for a person.
    pub async fn add_classification(
        &self,
        attribute_type_id: i64,
        owner_id: &str,
        value: &str,
        voided: bool,
    ) {
        self.classifications.write().await.push(ClassificationRow {
            attribute_type_id,
            owner_id: owner_id.to_owned(),
            value: value.to_owned(),
            voided,
        });
    }

    /// Records an encounter and its type.
    pub async fn add_encounter(&self, encounter_id: &str, encounter_type_id: &str) {
        self.encounter_types
            .write()
            .await
            .insert(encounter_id.to_owned(), encounter_type_id.to_owned());
    }

    /// Requires a view privilege for an encounter type.
    pub async fn set_view_privilege(&self, encounter_type_id: &str, privilege: &str) {
        self.view_privileges
            .write()
            .await
            .insert(encounter_type_id.to_owned(), privilege.to_owned());
    }
}

#[async_trait]
impl LocationHierarchy for InMemoryClinicalDirectory {
    async fn descendant_ids(
        &self,
        location_id: &str,
        include_self: bool,
    ) -> AppResult<Vec<String>> {
        let children = self.location_children.read().await;
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

#[async_trait]
impl PersonClassificationDirectory for InMemoryClinicalDirectory {
    async fn owner_ids_for_attribute(
        &self,
        attribute_type_id: i64,
        values: &BTreeSet<String>,
    ) -> AppResult<BTreeSet<String>> {
        Ok(self
            .classifications
            .read()
            .await
            .iter()
            .filter(|row| {
                !row.voided
                    && row.attribute_type_id == attribute_type_id
                    && values.contains(&row.value)
            })
            .map(|row| row.owner_id.clone())
            .collect())
    }
}

#[async_trait]
impl EncounterDirectory for InMemoryClinicalDirectory {
    async fn encounter_type_of(&self, encounter_id: &str) -> AppResult<Option<String>> {
        Ok(self.encounter_types.read().await.get(encounter_id).cloned())
    }

    async fn view_privilege_of(&self, encounter_type_id: &str) -> AppResult<Option<String>> {
        Ok(self
            .view_privileges
            .read()
            .await
            .get(encounter_type_id)
            .cloned())
    }
}
