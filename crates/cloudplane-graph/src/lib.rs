//! Cloudplane dependency graph and execution pipeline
//!
//! Builds a directed acyclic graph of resource nodes from a desired-state
//! document, orders it topologically, diffs each node against the durable
//! state from previous runs, and drives create/update/import/destroy through
//! each node's resource service — propagating outputs to dependents and
//! isolating failures to the failing subgraph.

pub mod diff;
pub mod error;
pub mod graph;
pub mod node;
pub mod pipeline;
pub mod plan;
pub mod report;
pub mod state;

// Re-exports
pub use diff::inputs_hash;
pub use error::{GraphError, Result};
pub use graph::CloudGraph;
pub use node::{ExecutionNode, NodeState};
pub use pipeline::{
    AppliedNode, ApplyContext, DestroyContext, NodeExecutor, Pipeline, PipelineOptions,
    TerraformExecutor,
};
pub use plan::{ActionType, ExecutionPlan, PlanAction, PlanSummary};
pub use report::{NodeReport, RunReport};
pub use state::{StateDocument, StateRecord, StateStore};
