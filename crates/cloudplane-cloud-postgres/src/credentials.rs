//! PostgreSQL credential shape

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn default_port() -> u16 {
    5432
}

fn default_database() -> String {
    "postgres".to_string()
}

/// Connection credentials for one PostgreSQL server.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PostgresCredentials {
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub username: String,

    pub password: String,

    /// Maintenance database used for catalog queries
    #[serde(default = "default_database")]
    pub database: String,
}
