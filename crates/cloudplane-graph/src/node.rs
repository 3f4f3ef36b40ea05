//! Execution nodes and their lifecycle states

use chrono::{DateTime, Utc};
use cloudplane_cloud::OutputMap;
use cloudplane_core::ResourceDescriptor;
use serde::{Deserialize, Serialize};

/// Lifecycle state of one node.
///
/// `pending → diffing → applying → applied | failed`, plus `skipped` for
/// nodes gated by a failed dependency or a failed credential check, and
/// `destroyed` on the teardown path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Pending,
    Diffing,
    Applying,
    Applied,
    Failed,
    Skipped,
    Destroyed,
}

impl NodeState {
    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NodeState::Applied | NodeState::Failed | NodeState::Skipped | NodeState::Destroyed
        )
    }
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeState::Pending => write!(f, "pending"),
            NodeState::Diffing => write!(f, "diffing"),
            NodeState::Applying => write!(f, "applying"),
            NodeState::Applied => write!(f, "applied"),
            NodeState::Failed => write!(f, "failed"),
            NodeState::Skipped => write!(f, "skipped"),
            NodeState::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// One graph node: a descriptor plus its execution bookkeeping.
///
/// Outputs are written exactly once, immediately before the transition to
/// `Applied`; dependents only read them after observing that state.
#[derive(Debug, Clone)]
pub struct ExecutionNode {
    pub descriptor: ResourceDescriptor,
    pub state: NodeState,
    pub outputs: Option<OutputMap>,
    pub error: Option<String>,
    pub applied_at: Option<DateTime<Utc>>,
}

impl ExecutionNode {
    pub fn new(descriptor: ResourceDescriptor) -> Self {
        Self {
            descriptor,
            state: NodeState::Pending,
            outputs: None,
            error: None,
            applied_at: None,
        }
    }

    /// Stable node identity (`kind/name`).
    pub fn id(&self) -> String {
        self.descriptor.id()
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn mark_applied(&mut self, outputs: OutputMap) {
        self.outputs = Some(outputs);
        self.state = NodeState::Applied;
        self.applied_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.state = NodeState::Failed;
    }

    pub fn mark_skipped(&mut self, reason: impl Into<String>) {
        self.error = Some(reason.into());
        self.state = NodeState::Skipped;
    }
}
