use std::collections::HashMap;

use async_trait::async_trait;
use medrova_application::RuntimeConfigRepository;
use medrova_core::AppResult;
use tokio::sync::RwLock;

/// In-memory runtime configuration implementation.
#[derive(Debug, Default)]
pub struct InMemoryRuntimeConfig {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryRuntimeConfig {
    /// Creates an empty configuration store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RuntimeConfigRepository for InMemoryRuntimeConfig {
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
