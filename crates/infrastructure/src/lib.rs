//! Infrastructure adapters for the Medrova access engine ports.

#![forbid(unsafe_code)]

mod in_memory_clinical_directory;
mod in_memory_grant_repository;
mod in_memory_runtime_config;
mod postgres_audit_repository;
mod postgres_clinical_directory;
mod postgres_grant_repository;
mod postgres_runtime_config;

pub use in_memory_clinical_directory::InMemoryClinicalDirectory;
pub use in_memory_grant_repository::InMemoryGrantRepository;
pub use in_memory_runtime_config::InMemoryRuntimeConfig;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_clinical_directory::PostgresClinicalDirectory;
pub use postgres_grant_repository::PostgresGrantRepository;
pub use postgres_runtime_config::PostgresRuntimeConfig;
