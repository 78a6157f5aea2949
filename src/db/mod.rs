//! Database layer: pool, resilient executor, migrations, repositories.

pub mod executor;
pub mod migrations;
pub mod pool;
pub mod repositories;

pub use executor::{BindValue, ExecuteResult, QueryError, QueryErrorKind, QueryExecutor, RetryPolicy};
pub use migrations::run_migrations;
pub use pool::{create_pool, create_test_pool};
