//! Synthesis modules for PostgreSQL resources

pub mod database_schema;
pub mod database_user;

pub use database_schema::DatabaseSchemaModule;
pub use database_user::DatabaseUserModule;

use cloudplane_cloud::OutputMap;

pub(crate) fn str_input<'a>(inputs: &'a OutputMap, key: &str) -> Option<&'a str> {
    inputs.get(key).and_then(|v| v.as_str())
}
