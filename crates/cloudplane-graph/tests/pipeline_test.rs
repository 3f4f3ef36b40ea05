//! End-to-end pipeline semantics against an in-memory executor

mod common;

use cloudplane_cloud::ProviderStore;
use cloudplane_graph::{
    ActionType, CloudGraph, NodeState, Pipeline, PipelineOptions, StateStore,
};
use common::{database, database_user, vpc, FakeProvider, MockExecutor};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;

struct Harness {
    _root: TempDir,
    store: Arc<ProviderStore>,
    executor: Arc<MockExecutor>,
    state_root: std::path::PathBuf,
}

impl Harness {
    fn new(executor: MockExecutor) -> Self {
        let root = TempDir::new().unwrap();
        let store = Arc::new(ProviderStore::new());
        store
            .insert(Arc::new(FakeProvider::new("acct")))
            .unwrap();
        Self {
            state_root: root.path().to_path_buf(),
            _root: root,
            store,
            executor: Arc::new(executor),
        }
    }

    fn with_bad_credentials(executor: MockExecutor) -> Self {
        let root = TempDir::new().unwrap();
        let store = Arc::new(ProviderStore::new());
        store
            .insert(Arc::new(FakeProvider::with_bad_credentials("acct")))
            .unwrap();
        Self {
            state_root: root.path().to_path_buf(),
            _root: root,
            store,
            executor: Arc::new(executor),
        }
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.store.clone(), StateStore::new(&self.state_root))
            .with_executor(self.executor.clone())
    }

    fn state(&self) -> StateStore {
        StateStore::new(&self.state_root)
    }
}

fn chain() -> Vec<cloudplane_core::ResourceDescriptor> {
    vec![
        vpc("net"),
        database("db", "net"),
        database_user("api", "db"),
    ]
}

#[tokio::test]
async fn applies_in_dependency_order() {
    let harness = Harness::new(MockExecutor::new());
    let graph = CloudGraph::new(chain()).unwrap();

    let report = harness
        .pipeline()
        .apply(graph, PipelineOptions::default())
        .await
        .unwrap();

    assert!(report.is_success());
    let ids = harness.executor.applied_ids();
    let position = |id: &str| ids.iter().position(|x| x == id).unwrap();
    assert!(position("vpc/net") < position("database/db"));
    assert!(position("database/db") < position("databaseUser/api"));
}

#[tokio::test]
async fn applied_timestamps_respect_edges() {
    let harness = Harness::new(MockExecutor::new());
    let graph = CloudGraph::new(chain()).unwrap();

    harness
        .pipeline()
        .apply(graph, PipelineOptions::default())
        .await
        .unwrap();

    // Dependency outputs flow into the dependent's recorded inputs, which
    // is only possible if the dependency applied first.
    let document = harness.state().load().await.unwrap();
    let user = document.get("databaseUser/api").unwrap();
    assert_eq!(user.inputs["database"], "database/db:id");
}

#[tokio::test]
async fn second_run_is_all_noops() {
    let harness = Harness::new(MockExecutor::new());

    let first = harness
        .pipeline()
        .apply(CloudGraph::new(chain()).unwrap(), PipelineOptions::default())
        .await
        .unwrap();
    assert!(first.is_success());
    assert_eq!(harness.executor.apply_count(), 3);

    let second = harness
        .pipeline()
        .apply(CloudGraph::new(chain()).unwrap(), PipelineOptions::default())
        .await
        .unwrap();

    // Zero additional backend calls; every node reports a no-op.
    assert_eq!(harness.executor.apply_count(), 3);
    assert!(second.is_success());
    for node in &second.nodes {
        assert_eq!(node.action, ActionType::NoOp, "{} re-applied", node.name);
        assert_eq!(node.state, NodeState::Applied);
    }
}

#[tokio::test]
async fn changed_input_reapplies_only_that_subtree() {
    let harness = Harness::new(MockExecutor::new());

    harness
        .pipeline()
        .apply(CloudGraph::new(chain()).unwrap(), PipelineOptions::default())
        .await
        .unwrap();

    // Change the user's literal input; vpc and db stay untouched.
    let mut descriptors = chain();
    descriptors[2] = database_user("api", "db").with_input("username", serde_json::json!("renamed"));
    let report = harness
        .pipeline()
        .apply(CloudGraph::new(descriptors).unwrap(), PipelineOptions::default())
        .await
        .unwrap();

    assert_eq!(report.node("net").unwrap().action, ActionType::NoOp);
    assert_eq!(report.node("db").unwrap().action, ActionType::NoOp);
    assert_eq!(report.node("api").unwrap().action, ActionType::Update);
    assert_eq!(harness.executor.apply_count(), 4);
}

#[tokio::test]
async fn failure_isolates_to_the_dependent_subgraph() {
    // a depends on b; c is independent. b fails.
    let harness = Harness::new(MockExecutor::failing(&["database/b"]));
    let descriptors = vec![
        vpc("net"),
        database("b", "net"),
        database_user("a", "b"),
        vpc("c"),
    ];

    let report = harness
        .pipeline()
        .apply(CloudGraph::new(descriptors).unwrap(), PipelineOptions::default())
        .await
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.node("b").unwrap().state, NodeState::Failed);
    assert!(report.node("b").unwrap().error.is_some());
    assert_eq!(report.node("a").unwrap().state, NodeState::Skipped);
    assert_eq!(report.node("c").unwrap().state, NodeState::Applied);
    assert_eq!(report.node("net").unwrap().state, NodeState::Applied);
}

#[tokio::test]
async fn retry_after_failure_skips_applied_nodes() {
    let harness = Harness::new(MockExecutor::failing(&["database/b"]));
    let descriptors = vec![vpc("net"), database("b", "net"), database_user("a", "b")];

    harness
        .pipeline()
        .apply(
            CloudGraph::new(descriptors.clone()).unwrap(),
            PipelineOptions::default(),
        )
        .await
        .unwrap();

    // Second run with the failure cleared: net is already applied and
    // reports a no-op; only b and a run.
    let harness2 = Harness {
        state_root: harness.state_root.clone(),
        _root: TempDir::new().unwrap(),
        store: harness.store.clone(),
        executor: Arc::new(MockExecutor::new()),
    };
    let report = Pipeline::new(harness2.store.clone(), StateStore::new(&harness2.state_root))
        .with_executor(harness2.executor.clone())
        .apply(CloudGraph::new(descriptors).unwrap(), PipelineOptions::default())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.node("net").unwrap().action, ActionType::NoOp);
    assert_eq!(
        harness2.executor.applied_ids(),
        vec!["database/b".to_string(), "databaseUser/a".to_string()]
    );
}

#[tokio::test]
async fn bad_credentials_gate_every_node_of_that_provider() {
    let harness = Harness::with_bad_credentials(MockExecutor::new());
    let graph = CloudGraph::new(chain()).unwrap();

    let report = harness
        .pipeline()
        .apply(graph, PipelineOptions::default())
        .await
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(harness.executor.apply_count(), 0);
    assert_eq!(report.node("net").unwrap().state, NodeState::Failed);
    // Downstream nodes never enter applying.
    assert_eq!(report.node("db").unwrap().state, NodeState::Skipped);
    assert_eq!(report.node("api").unwrap().state, NodeState::Skipped);
}

#[tokio::test]
async fn pre_cancelled_run_applies_nothing() {
    let harness = Harness::new(MockExecutor::new());
    let (tx, rx) = watch::channel(true);

    let options = PipelineOptions {
        cancel: Some(rx),
        ..Default::default()
    };
    let report = harness
        .pipeline()
        .apply(CloudGraph::new(chain()).unwrap(), options)
        .await
        .unwrap();
    drop(tx);

    assert_eq!(harness.executor.apply_count(), 0);
    for node in &report.nodes {
        assert_eq!(node.state, NodeState::Skipped);
    }
}

#[tokio::test]
async fn external_id_triggers_import() {
    let harness = Harness::new(MockExecutor::new());
    let descriptors = vec![vpc("net").with_external_id("vpc-preexisting")];

    let report = harness
        .pipeline()
        .apply(CloudGraph::new(descriptors).unwrap(), PipelineOptions::default())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.node("net").unwrap().action, ActionType::Import);
    let applied = harness.executor.applied.lock().unwrap().clone();
    assert_eq!(applied, vec![("vpc/net".to_string(), ActionType::Import)]);
}

#[tokio::test]
async fn destroy_runs_in_reverse_order() {
    let harness = Harness::new(MockExecutor::new());

    harness
        .pipeline()
        .apply(CloudGraph::new(chain()).unwrap(), PipelineOptions::default())
        .await
        .unwrap();

    let report = harness
        .pipeline()
        .destroy(CloudGraph::new(chain()).unwrap(), PipelineOptions::default())
        .await
        .unwrap();

    assert!(report.is_success());
    let destroyed = harness.executor.destroyed.lock().unwrap().clone();
    assert_eq!(
        destroyed,
        vec![
            "databaseUser/api".to_string(),
            "database/db".to_string(),
            "vpc/net".to_string(),
        ]
    );

    // State records are gone afterwards.
    let document = harness.state().load().await.unwrap();
    assert!(document.records.is_empty());
}

#[tokio::test]
async fn failed_destroy_protects_dependencies() {
    let harness = Harness::new(MockExecutor::new());
    harness
        .pipeline()
        .apply(CloudGraph::new(chain()).unwrap(), PipelineOptions::default())
        .await
        .unwrap();

    // New executor that fails destroying the user; db and net must survive.
    let failing = Arc::new(MockExecutor::failing(&["databaseUser/api"]));
    let report = Pipeline::new(harness.store.clone(), StateStore::new(&harness.state_root))
        .with_executor(failing.clone())
        .destroy(CloudGraph::new(chain()).unwrap(), PipelineOptions::default())
        .await
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.node("api").unwrap().state, NodeState::Failed);
    assert_eq!(report.node("db").unwrap().state, NodeState::Skipped);
    assert_eq!(report.node("net").unwrap().state, NodeState::Skipped);
    assert!(failing.destroyed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn plan_reports_creates_noops_and_orphans() {
    let harness = Harness::new(MockExecutor::new());

    harness
        .pipeline()
        .apply(CloudGraph::new(chain()).unwrap(), PipelineOptions::default())
        .await
        .unwrap();

    // Drop the user from the document and add a new vpc.
    let descriptors = vec![vpc("net"), database("db", "net"), vpc("extra")];
    let plan = harness
        .pipeline()
        .plan(&CloudGraph::new(descriptors).unwrap())
        .await
        .unwrap();

    assert!(plan.has_changes);
    let summary = plan.summary();
    assert_eq!(summary.create, 1);
    assert_eq!(summary.no_change, 2);
    assert_eq!(summary.delete, 1);
    let delete = plan.actions_by_type(ActionType::Delete);
    assert_eq!(delete[0].name, "databaseUser/api");
}

#[tokio::test]
async fn prune_destroys_orphaned_records() {
    let harness = Harness::new(MockExecutor::new());

    harness
        .pipeline()
        .apply(CloudGraph::new(chain()).unwrap(), PipelineOptions::default())
        .await
        .unwrap();

    let descriptors = vec![vpc("net"), database("db", "net")];
    let options = PipelineOptions {
        prune: true,
        ..Default::default()
    };
    let report = harness
        .pipeline()
        .apply(CloudGraph::new(descriptors).unwrap(), options)
        .await
        .unwrap();

    assert!(report.is_success());
    let destroyed = harness.executor.destroyed.lock().unwrap().clone();
    assert_eq!(destroyed, vec!["databaseUser/api".to_string()]);
    let document = harness.state().load().await.unwrap();
    assert!(document.get("databaseUser/api").is_none());
    assert!(document.get("database/db").is_some());
}
