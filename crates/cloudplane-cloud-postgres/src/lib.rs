//! PostgreSQL provider for Cloudplane
//!
//! Live queries shell out to the `psql` CLI against the server's catalogs;
//! declarative apply synthesizes constructs for the `cyrilgdn/postgresql`
//! Terraform provider.
//!
//! Implemented kinds: `databaseSchema`, `databaseUser`.

pub mod credentials;
pub mod error;
pub mod modules;
pub mod provider;
pub mod psql;
pub mod services;

// Re-exports
pub use credentials::PostgresCredentials;
pub use error::{PgError, Result};
pub use provider::PostgresProvider;
