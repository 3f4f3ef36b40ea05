//! The closed set of provider-agnostic resource kinds

use crate::error::CoreError;
use crate::schema::{self, ResourceSchema};
use serde::{Deserialize, Serialize};

/// A provider-agnostic category of infrastructure object.
///
/// The set is closed and defined at compile time; each provider implements
/// only a subset. Wire names are camelCase (`database`, `databaseUser`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Database,
    DatabaseSchema,
    DatabaseUser,
    ComputeInstance,
    AppDeployment,
    Vpc,
    Cluster,
}

/// All kinds, in a stable order.
pub const RESOURCE_KINDS: &[ResourceKind] = &[
    ResourceKind::Database,
    ResourceKind::DatabaseSchema,
    ResourceKind::DatabaseUser,
    ResourceKind::ComputeInstance,
    ResourceKind::AppDeployment,
    ResourceKind::Vpc,
    ResourceKind::Cluster,
];

impl ResourceKind {
    /// Wire name of the kind (`databaseUser`, `vpc`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Database => "database",
            ResourceKind::DatabaseSchema => "databaseSchema",
            ResourceKind::DatabaseUser => "databaseUser",
            ResourceKind::ComputeInstance => "computeInstance",
            ResourceKind::AppDeployment => "appDeployment",
            ResourceKind::Vpc => "vpc",
            ResourceKind::Cluster => "cluster",
        }
    }

    /// Input schema for this kind
    pub fn input_schema(&self) -> &'static ResourceSchema {
        schema::input_schema(*self)
    }

    /// Output schema for this kind
    pub fn output_schema(&self) -> &'static ResourceSchema {
        schema::output_schema(*self)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RESOURCE_KINDS
            .iter()
            .find(|k| k.as_str() == s)
            .copied()
            .ok_or_else(|| CoreError::UnknownKind(s.to_string()))
    }
}
