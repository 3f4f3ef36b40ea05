//! DigitalOcean credential shape

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Credentials for one DigitalOcean account.
///
/// The schema is closed: unknown fields are reported as violations before
/// any network call.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DigitalOceanCredentials {
    /// Personal access token with read/write scope
    pub token: String,

    /// Region used when a descriptor does not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_region: Option<String>,
}
