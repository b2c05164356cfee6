mod metrics;
mod rate_limit;
mod repository;
mod user;

// Publicly expose the Metrics abstraction
pub use metrics::{Metrics, MetricsPtr};

// Publicly expose the persistence and admission abstractions
pub use rate_limit::{RateLimitError, RateLimitStore, RateLimitStorePtr};
pub use repository::{DuplicateEmail, Repository, RepositoryPtr};
pub use user::{NewUser, User};
