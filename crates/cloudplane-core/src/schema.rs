//! Static input/output schemas for each resource kind
//!
//! Pure data: no behavior beyond lookup. The tables mirror the shapes the
//! concrete providers normalize their API responses into.

use crate::kind::ResourceKind;

/// Semantic type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Boolean,
    /// A string that must never appear in logs or display labels.
    Secret,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::String => write!(f, "string"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Secret => write!(f, "secret"),
        }
    }
}

/// One field in an input or output schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
}

const fn req(name: &'static str, field_type: FieldType) -> FieldSpec {
    FieldSpec { name, field_type, required: true }
}

const fn opt(name: &'static str, field_type: FieldType) -> FieldSpec {
    FieldSpec { name, field_type, required: false }
}

/// A full schema: the set of fields a descriptor's inputs (or a module's
/// outputs) may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSchema {
    pub fields: &'static [FieldSpec],
}

impl ResourceSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }
}

use FieldType::{Boolean, Integer, Secret, String as Str};

static DATABASE_INPUTS: ResourceSchema = ResourceSchema {
    fields: &[
        req("name", Str),
        req("databaseType", Str),
        req("databaseVersion", Str),
        opt("databaseSize", Str),
        opt("vpc", Str),
        opt("region", Str),
    ],
};

static DATABASE_OUTPUTS: ResourceSchema = ResourceSchema {
    fields: &[
        req("id", Str),
        req("protocol", Str),
        req("host", Str),
        req("port", Integer),
        opt("username", Str),
        opt("password", Secret),
        opt("certificate", Str),
    ],
};

static DATABASE_SCHEMA_INPUTS: ResourceSchema = ResourceSchema {
    fields: &[
        req("name", Str),
        req("database", Str),
        opt("databaseType", Str),
    ],
};

static DATABASE_SCHEMA_OUTPUTS: ResourceSchema = ResourceSchema {
    fields: &[
        req("id", Str),
        req("name", Str),
        req("protocol", Str),
        req("host", Str),
        req("port", Integer),
        req("url", Str),
    ],
};

static DATABASE_USER_INPUTS: ResourceSchema = ResourceSchema {
    fields: &[
        req("username", Str),
        req("database", Str),
        opt("host", Str),
        opt("port", Integer),
    ],
};

static DATABASE_USER_OUTPUTS: ResourceSchema = ResourceSchema {
    fields: &[
        req("id", Str),
        req("username", Str),
        req("password", Secret),
        req("database", Str),
        req("protocol", Str),
        req("host", Str),
        req("port", Integer),
        req("url", Secret),
    ],
};

static COMPUTE_INSTANCE_INPUTS: ResourceSchema = ResourceSchema {
    fields: &[
        req("name", Str),
        req("region", Str),
        req("size", Str),
        req("image", Str),
        opt("vpc", Str),
    ],
};

static COMPUTE_INSTANCE_OUTPUTS: ResourceSchema = ResourceSchema {
    fields: &[
        req("id", Str),
        req("name", Str),
        req("ipAddress", Str),
        req("status", Str),
    ],
};

static APP_DEPLOYMENT_INPUTS: ResourceSchema = ResourceSchema {
    fields: &[
        req("name", Str),
        req("image", Str),
        opt("replicas", Integer),
        opt("region", Str),
        opt("public", Boolean),
    ],
};

static APP_DEPLOYMENT_OUTPUTS: ResourceSchema = ResourceSchema {
    fields: &[
        req("id", Str),
        req("name", Str),
        req("url", Str),
        req("status", Str),
    ],
};

static VPC_INPUTS: ResourceSchema = ResourceSchema {
    fields: &[
        req("name", Str),
        req("region", Str),
        opt("description", Str),
    ],
};

static VPC_OUTPUTS: ResourceSchema = ResourceSchema {
    fields: &[
        req("id", Str),
        req("name", Str),
        req("region", Str),
        opt("description", Str),
    ],
};

static CLUSTER_INPUTS: ResourceSchema = ResourceSchema {
    fields: &[
        req("name", Str),
        req("region", Str),
        req("kubernetesVersion", Str),
        opt("vpc", Str),
        opt("nodeCount", Integer),
    ],
};

static CLUSTER_OUTPUTS: ResourceSchema = ResourceSchema {
    fields: &[
        req("id", Str),
        req("name", Str),
        req("vpc", Str),
        req("kubernetesVersion", Str),
        req("configPath", Str),
    ],
};

/// Input schema lookup.
pub fn input_schema(kind: ResourceKind) -> &'static ResourceSchema {
    match kind {
        ResourceKind::Database => &DATABASE_INPUTS,
        ResourceKind::DatabaseSchema => &DATABASE_SCHEMA_INPUTS,
        ResourceKind::DatabaseUser => &DATABASE_USER_INPUTS,
        ResourceKind::ComputeInstance => &COMPUTE_INSTANCE_INPUTS,
        ResourceKind::AppDeployment => &APP_DEPLOYMENT_INPUTS,
        ResourceKind::Vpc => &VPC_INPUTS,
        ResourceKind::Cluster => &CLUSTER_INPUTS,
    }
}

/// Output schema lookup.
pub fn output_schema(kind: ResourceKind) -> &'static ResourceSchema {
    match kind {
        ResourceKind::Database => &DATABASE_OUTPUTS,
        ResourceKind::DatabaseSchema => &DATABASE_SCHEMA_OUTPUTS,
        ResourceKind::DatabaseUser => &DATABASE_USER_OUTPUTS,
        ResourceKind::ComputeInstance => &COMPUTE_INSTANCE_OUTPUTS,
        ResourceKind::AppDeployment => &APP_DEPLOYMENT_OUTPUTS,
        ResourceKind::Vpc => &VPC_OUTPUTS,
        ResourceKind::Cluster => &CLUSTER_OUTPUTS,
    }
}
