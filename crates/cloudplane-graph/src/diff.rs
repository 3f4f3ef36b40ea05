//! Input resolution and semantic diffing

use crate::error::{GraphError, Result};
use crate::node::ExecutionNode;
use crate::plan::ActionType;
use crate::state::StateRecord;
use cloudplane_core::{InputValue, ResourceDescriptor};
use cloudplane_cloud::OutputMap;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Canonical hash of a resolved input map.
///
/// BTreeMap ordering plus compact JSON makes this stable for a fixed set of
/// inputs, which is what the idempotence guarantee rests on.
pub fn inputs_hash(inputs: &OutputMap) -> String {
    let canonical = serde_json::to_string(inputs).unwrap_or_default();
    let digest = Sha256::digest(canonical.as_bytes());
    format!("{digest:x}")
}

/// Substitute every reference in the descriptor's inputs with the output of
/// its (already applied) dependency.
pub fn resolve_inputs(
    descriptor: &ResourceDescriptor,
    dependency_outputs: &HashMap<String, OutputMap>,
) -> Result<OutputMap> {
    let mut resolved = OutputMap::new();
    for (key, value) in &descriptor.inputs {
        match value {
            InputValue::Literal(literal) => {
                resolved.insert(key.clone(), literal.clone());
            }
            InputValue::Ref(reference) => {
                let outputs = dependency_outputs.get(&reference.resource).ok_or_else(|| {
                    GraphError::MissingDependency {
                        from: descriptor.name.clone(),
                        to: reference.resource.clone(),
                    }
                })?;
                let output = outputs.get(&reference.output).ok_or_else(|| {
                    GraphError::UnknownOutput {
                        resource: reference.resource.clone(),
                        output: reference.output.clone(),
                    }
                })?;
                resolved.insert(key.clone(), output.clone());
            }
        }
    }
    Ok(resolved)
}

/// Decide what to do with a node given its resolved inputs and last-applied
/// record.
///
/// No record + external id -> adopt the live resource. No record otherwise
/// -> create. Matching hash -> no-op (zero apply calls). Anything else ->
/// update.
pub fn decide_action(
    node: &ExecutionNode,
    resolved: &OutputMap,
    record: Option<&StateRecord>,
) -> ActionType {
    match record {
        None => {
            if node.descriptor.external_id.is_some() {
                ActionType::Import
            } else {
                ActionType::Create
            }
        }
        Some(record) => {
            if record.inputs_hash == inputs_hash(resolved) {
                ActionType::NoOp
            } else {
                ActionType::Update
            }
        }
    }
}
