//! Synthesis modules for DigitalOcean resources

pub mod cluster;
pub mod database;
pub mod database_user;
pub mod vpc;

pub use cluster::ClusterModule;
pub use database::DatabaseModule;
pub use database_user::DatabaseUserModule;
pub use vpc::VpcModule;

use cloudplane_cloud::OutputMap;

/// Read a string input, if present.
pub(crate) fn str_input<'a>(inputs: &'a OutputMap, key: &str) -> Option<&'a str> {
    inputs.get(key).and_then(|v| v.as_str())
}
