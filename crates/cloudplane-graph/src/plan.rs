//! Plan actions produced by the diff step

use cloudplane_core::ResourceKind;
use serde::{Deserialize, Serialize};

/// What the pipeline intends to do with one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new resource
    Create,
    /// Update an existing resource in place
    Update,
    /// Adopt a pre-existing live resource into managed state
    Import,
    /// No semantic difference; apply is a no-op
    NoOp,
    /// Tear down a resource no longer in the desired state
    Delete,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Import => write!(f, "import"),
            ActionType::NoOp => write!(f, "no-op"),
            ActionType::Delete => write!(f, "delete"),
        }
    }
}

/// One planned action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanAction {
    pub name: String,
    pub kind: ResourceKind,
    pub provider: String,
    pub action: ActionType,

    /// Human-readable labels for the constructs involved, from the module's
    /// display names. Cosmetic only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub display: Vec<String>,
}

/// The full plan for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub actions: Vec<PlanAction>,
    pub has_changes: bool,
}

impl ExecutionPlan {
    pub fn new(actions: Vec<PlanAction>) -> Self {
        let has_changes = actions.iter().any(|a| a.action != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    pub fn actions_by_type(&self, action: ActionType) -> Vec<&PlanAction> {
        self.actions.iter().filter(|a| a.action == action).collect()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            import: self.actions_by_type(ActionType::Import).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            no_change: self.actions_by_type(ActionType::NoOp).len(),
        }
    }
}

/// Counts per action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub import: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to import, {} to delete, {} unchanged",
            self.create, self.update, self.import, self.delete, self.no_change
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(name: &str, action: ActionType) -> PlanAction {
        PlanAction {
            name: name.to_string(),
            kind: ResourceKind::Vpc,
            provider: "acct".to_string(),
            action,
            display: Vec::new(),
        }
    }

    #[test]
    fn all_noops_means_no_changes() {
        let plan = ExecutionPlan::new(vec![action("a", ActionType::NoOp)]);
        assert!(!plan.has_changes);
    }

    #[test]
    fn summary_counts() {
        let plan = ExecutionPlan::new(vec![
            action("a", ActionType::Create),
            action("b", ActionType::Create),
            action("c", ActionType::NoOp),
            action("d", ActionType::Import),
        ]);
        let summary = plan.summary();
        assert_eq!(summary.create, 2);
        assert_eq!(summary.import, 1);
        assert_eq!(summary.no_change, 1);
        assert!(plan.has_changes);
        assert_eq!(
            summary.to_string(),
            "2 to create, 0 to update, 1 to import, 0 to delete, 1 unchanged"
        );
    }
}
