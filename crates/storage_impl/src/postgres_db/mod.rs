//! Postgres-backed `StorageInterface`, gated behind the `postgres` feature
//! so the default build stays dependency-light for tests that only need
//! [`crate::mock_db::MockDb`].

pub mod models;
pub mod schema;
pub mod store;

pub use store::{PgPool, PostgresStore};
