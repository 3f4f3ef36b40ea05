//! Resource services for DigitalOcean

pub mod cluster;
pub mod database;
pub mod database_user;
pub mod vpc;

pub use cluster::ClusterService;
pub use database::DatabaseService;
pub use database_user::DatabaseUserService;
pub use vpc::VpcService;

use cloudplane_terraform::ProviderBlock;
use serde_json::json;

/// The shared `digitalocean/digitalocean` provider block.
///
/// Registered once per synthesis scope; the stack keeps the first
/// registration.
pub(crate) fn digitalocean_provider_block(token: &str) -> ProviderBlock {
    ProviderBlock {
        vendor: "digitalocean".to_string(),
        source: "digitalocean/digitalocean".to_string(),
        version: "~> 2.34".to_string(),
        properties: [("token".to_string(), json!(token))].into_iter().collect(),
    }
}
