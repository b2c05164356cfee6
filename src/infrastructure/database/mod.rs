mod memory_repository;
mod postgres_repository;


pub use memory_repository::MemoryRepository;
pub use postgres_repository::{connect_with_retry, PostgresRepository};

use crate::config::DatabaseConfig;
use crate::domain::RepositoryPtr;
use anyhow::Result;
use std::sync::Arc;

/// Connects to Postgres, bootstraps the schema, and returns the repository.
pub async fn create_postgres_repository(config: &DatabaseConfig) -> Result<RepositoryPtr> {
    // ---
    let pool = connect_with_retry(config).await?;
    let repository = PostgresRepository::new(pool);
    repository.init_schema().await?;

    Ok(Arc::new(repository))
}

/// Creates a process-local repository. Data is lost on restart.
pub fn create_memory_repository() -> RepositoryPtr {
    // ---
    tracing::warn!("DATABASE_URL not set, using in-memory user repository");
    Arc::new(MemoryRepository::new())
}
