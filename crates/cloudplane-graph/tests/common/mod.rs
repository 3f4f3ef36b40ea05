//! Shared test fixtures: an in-memory executor and a fake provider

use async_trait::async_trait;
use cloudplane_cloud::{
    CloudError, CloudProvider, OutputMap, ResourceService, Result as CloudResult,
};
use cloudplane_core::{ResourceDescriptor, ResourceKind};
use cloudplane_graph::pipeline::{ApplyContext, DestroyContext};
use cloudplane_graph::{ActionType, AppliedNode, GraphError, NodeExecutor};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Mutex;

/// Executor that fakes backend invocations and records everything.
#[derive(Default)]
pub struct MockExecutor {
    /// Node ids that should fail to apply
    pub fail: HashSet<String>,

    /// (node id, action) in completion order
    pub applied: Mutex<Vec<(String, ActionType)>>,

    /// Node ids in destroy order
    pub destroyed: Mutex<Vec<String>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(fail: &[&str]) -> Self {
        Self {
            fail: fail.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn apply_count(&self) -> usize {
        self.applied.lock().unwrap().len()
    }

    pub fn applied_ids(&self) -> Vec<String> {
        self.applied
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[async_trait]
impl NodeExecutor for MockExecutor {
    async fn apply(&self, ctx: ApplyContext) -> cloudplane_graph::Result<AppliedNode> {
        if self.fail.contains(&ctx.node_id) {
            return Err(GraphError::StateError(format!(
                "synthetic failure for {}",
                ctx.node_id
            )));
        }

        self.applied
            .lock()
            .unwrap()
            .push((ctx.node_id.clone(), ctx.action));

        // Deterministic outputs covering the whole output schema.
        let mut outputs = OutputMap::new();
        for field in ctx.kind.output_schema().fields {
            outputs.insert(
                field.name.to_string(),
                json!(format!("{}:{}", ctx.node_id, field.name)),
            );
        }
        Ok(AppliedNode {
            outputs,
            terraform_state: None,
        })
    }

    async fn destroy(&self, ctx: DestroyContext) -> cloudplane_graph::Result<()> {
        if self.fail.contains(&ctx.node_id) {
            return Err(GraphError::StateError(format!(
                "synthetic destroy failure for {}",
                ctx.node_id
            )));
        }
        self.destroyed.lock().unwrap().push(ctx.node_id);
        Ok(())
    }
}

/// Provider whose credential check is scripted; services are never reached
/// because the mock executor bypasses them.
pub struct FakeProvider {
    name: String,
    auth_ok: bool,
}

impl FakeProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            auth_ok: true,
        }
    }

    pub fn with_bad_credentials(name: &str) -> Self {
        Self {
            name: name.to_string(),
            auth_ok: false,
        }
    }
}

#[async_trait]
impl CloudProvider for FakeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn provider_type(&self) -> &str {
        "fake"
    }

    fn resources(&self) -> Vec<ResourceKind> {
        cloudplane_core::kind::RESOURCE_KINDS.to_vec()
    }

    fn service(&self, kind: ResourceKind) -> CloudResult<&dyn ResourceService> {
        Err(CloudError::UnsupportedResource {
            kind,
            provider_type: "fake".to_string(),
        })
    }

    async fn test_credentials(&self) -> CloudResult<bool> {
        Ok(self.auth_ok)
    }
}

pub fn vpc(name: &str) -> ResourceDescriptor {
    ResourceDescriptor::new(ResourceKind::Vpc, name, "acct")
        .with_input("name", json!(name))
        .with_input("region", json!("nyc3"))
}

pub fn database(name: &str, vpc: &str) -> ResourceDescriptor {
    ResourceDescriptor::new(ResourceKind::Database, name, "acct")
        .with_input("name", json!(name))
        .with_input("databaseType", json!("postgres"))
        .with_input("databaseVersion", json!("15"))
        .with_reference("vpc", vpc, "id")
}

pub fn database_user(name: &str, db: &str) -> ResourceDescriptor {
    ResourceDescriptor::new(ResourceKind::DatabaseUser, name, "acct")
        .with_input("username", json!(name))
        .with_reference("database", db, "id")
}
