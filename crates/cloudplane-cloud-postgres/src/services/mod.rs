//! Resource services for PostgreSQL

pub mod database_schema;
pub mod database_user;

pub use database_schema::DatabaseSchemaService;
pub use database_user::DatabaseUserService;

use crate::credentials::PostgresCredentials;
use cloudplane_terraform::ProviderBlock;
use serde_json::json;

/// The `cyrilgdn/postgresql` provider block.
///
/// `superuser = false` and `sslmode = disable` are deliberate safety flags
/// carried over from how the provider is configured everywhere else.
pub(crate) fn postgresql_provider_block(credentials: &PostgresCredentials) -> ProviderBlock {
    ProviderBlock {
        vendor: "postgresql".to_string(),
        source: "cyrilgdn/postgresql".to_string(),
        version: "~> 1.21".to_string(),
        properties: [
            ("host".to_string(), json!(credentials.host)),
            ("port".to_string(), json!(credentials.port)),
            ("username".to_string(), json!(credentials.username)),
            ("password".to_string(), json!(credentials.password)),
            ("superuser".to_string(), json!(false)),
            ("sslmode".to_string(), json!("disable")),
        ]
        .into_iter()
        .collect(),
    }
}
