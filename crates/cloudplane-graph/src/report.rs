//! Per-run result reporting
//!
//! A run never collapses to one pass/fail boolean: the report enumerates
//! every node's terminal state so a caller can retry just the failed
//! subgraph.

use crate::node::NodeState;
use crate::plan::ActionType;
use cloudplane_core::ResourceKind;
use serde::{Deserialize, Serialize};

/// Terminal record for one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeReport {
    pub name: String,
    pub kind: ResourceKind,
    pub provider: String,
    pub action: ActionType,
    pub state: NodeState,

    /// Error taxonomy + backend output for failed nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub duration_ms: u64,
}

/// The outcome of one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique id for this run
    pub run_id: String,

    pub nodes: Vec<NodeReport>,

    pub duration_ms: u64,
}

impl RunReport {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            nodes: Vec::new(),
            duration_ms: 0,
        }
    }

    /// True when every node reached `Applied`, `Destroyed`, or a no-op.
    pub fn is_success(&self) -> bool {
        self.nodes
            .iter()
            .all(|n| !matches!(n.state, NodeState::Failed | NodeState::Skipped))
    }

    pub fn failed(&self) -> Vec<&NodeReport> {
        self.nodes
            .iter()
            .filter(|n| n.state == NodeState::Failed)
            .collect()
    }

    pub fn node(&self, name: &str) -> Option<&NodeReport> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for node in &self.nodes {
            write!(f, "{} ({}): {} [{}]", node.name, node.kind, node.state, node.action)?;
            if let Some(error) = &node.error {
                write!(f, " - {error}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
