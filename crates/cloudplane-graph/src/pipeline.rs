//! Execution pipeline
//!
//! Drives a validated [`CloudGraph`] through diff and apply: resolves each
//! node's provider, substitutes reference inputs with dependency outputs,
//! decides an action per node against durable state, and executes
//! create/update/import through the node's resource service — bounded
//! concurrency for independent subgraphs, strict ordering along edges.
//!
//! The actual backend invocation sits behind [`NodeExecutor`] so the
//! scheduling semantics are testable without a terraform binary; the
//! default [`TerraformExecutor`] synthesizes a per-node scope and drives
//! the CLI.

use crate::diff::{decide_action, inputs_hash, resolve_inputs};
use crate::error::Result;
use crate::graph::CloudGraph;
use crate::node::NodeState;
use crate::plan::{ActionType, ExecutionPlan, PlanAction};
use crate::report::{NodeReport, RunReport};
use crate::state::{StateRecord, StateStore};
use async_trait::async_trait;
use chrono::Utc;
use cloudplane_cloud::{
    check_import_coverage, CloudProvider, OutputMap, ProviderStore, RandomSecrets,
    SecretGenerator,
};
use cloudplane_core::{FieldType, ResourceKind};
use cloudplane_terraform::{Stack, Terraform};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinSet;

/// Options for one pipeline run.
#[derive(Clone)]
pub struct PipelineOptions {
    /// Upper bound on concurrently applying nodes
    pub concurrency: usize,

    /// Timeout applied to each node's backend invocation
    pub call_timeout: Duration,

    /// Run-level cancellation: flip the watch value to `true` to abort
    /// in-flight work and keep further nodes from starting
    pub cancel: Option<watch::Receiver<bool>>,

    /// Destroy state records with no matching descriptor after the graph
    /// applies
    pub prune: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            call_timeout: Duration::from_secs(600),
            cancel: None,
            prune: false,
        }
    }
}

/// Everything an executor needs to apply one node.
pub struct ApplyContext {
    pub provider: Arc<dyn CloudProvider>,
    pub kind: ResourceKind,
    pub node_id: String,
    pub resolved_inputs: OutputMap,
    pub action: ActionType,
    pub external_id: Option<String>,
    pub prior_state: Option<serde_json::Value>,
    pub workdir: PathBuf,
    pub timeout: Duration,
}

/// Everything an executor needs to destroy one node.
pub struct DestroyContext {
    pub provider: Arc<dyn CloudProvider>,
    pub kind: ResourceKind,
    pub node_id: String,
    pub resolved_inputs: OutputMap,
    pub prior_state: Option<serde_json::Value>,
    pub workdir: PathBuf,
    pub timeout: Duration,
}

/// Result of one successful node apply.
pub struct AppliedNode {
    pub outputs: OutputMap,
    pub terraform_state: Option<serde_json::Value>,
}

/// Backend invocation boundary.
///
/// One node at a time; the pipeline owns ordering, concurrency, and state.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    async fn apply(&self, ctx: ApplyContext) -> Result<AppliedNode>;
    async fn destroy(&self, ctx: DestroyContext) -> Result<()>;
}

/// Default executor: synthesize a per-node scope and drive the terraform
/// CLI through init/plan/apply (or import first, when adopting).
pub struct TerraformExecutor {
    secrets: Arc<dyn SecretGenerator>,
}

impl TerraformExecutor {
    pub fn new() -> Self {
        Self {
            secrets: Arc::new(RandomSecrets::new()),
        }
    }

    pub fn with_secrets(secrets: Arc<dyn SecretGenerator>) -> Self {
        Self { secrets }
    }
}

impl Default for TerraformExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeExecutor for TerraformExecutor {
    async fn apply(&self, ctx: ApplyContext) -> Result<AppliedNode> {
        tokio::fs::create_dir_all(&ctx.workdir).await?;

        let service = ctx.provider.service(ctx.kind)?;
        let mut stack = Stack::new();
        service.configure_terraform_providers(&mut stack);
        let module =
            service.plan_module(&mut stack, &ctx.node_id, &ctx.resolved_inputs, self.secrets.as_ref())?;
        let module_outputs = module.outputs().clone();

        let output_schema = ctx.kind.output_schema();
        for (key, value) in &module_outputs {
            let Some(expr) = value.as_str() else { continue };
            if !expr.contains("${") {
                continue;
            }
            let sensitive = output_schema
                .field(key)
                .map(|f| f.field_type == FieldType::Secret)
                .unwrap_or(false);
            if sensitive {
                stack.add_sensitive_output(key.clone(), value.clone());
            } else {
                stack.add_output(key.clone(), value.clone());
            }
        }

        stack.write_to(&ctx.workdir).await?;
        let terraform = Terraform::new(&ctx.workdir).with_timeout(ctx.timeout);

        if let Some(prior) = &ctx.prior_state {
            terraform.write_state(prior).await?;
        }

        terraform.init().await?;

        if ctx.action == ActionType::Import {
            let external_id = ctx.external_id.as_deref().unwrap_or_default();
            let imports = module.gen_imports(external_id)?;
            check_import_coverage(&stack.resource_addresses(), &imports)?;
            for (address, id) in &imports {
                tracing::info!("Importing {address} as {id}");
                terraform.import(address.as_str(), id).await?;
            }
        }

        terraform.plan().await?;
        terraform.apply().await?;

        let applied = terraform.outputs().await?;
        let terraform_state = terraform.read_state().await?;

        // Replace interpolation expressions with the values terraform
        // computed; everything else (literals, sentinels) stands as-is.
        let mut outputs = module_outputs;
        for (key, value) in outputs.iter_mut() {
            if value.as_str().is_some_and(|s| s.contains("${")) {
                if let Some(resolved) = applied.get(key) {
                    *value = resolved.clone();
                }
            }
        }

        Ok(AppliedNode {
            outputs,
            terraform_state,
        })
    }

    async fn destroy(&self, ctx: DestroyContext) -> Result<()> {
        tokio::fs::create_dir_all(&ctx.workdir).await?;

        let service = ctx.provider.service(ctx.kind)?;
        let mut stack = Stack::new();
        service.configure_terraform_providers(&mut stack);
        let _module =
            service.plan_module(&mut stack, &ctx.node_id, &ctx.resolved_inputs, self.secrets.as_ref())?;

        stack.write_to(&ctx.workdir).await?;
        let terraform = Terraform::new(&ctx.workdir).with_timeout(ctx.timeout);

        if let Some(prior) = &ctx.prior_state {
            terraform.write_state(prior).await?;
        }

        terraform.init().await?;
        terraform.destroy().await?;
        Ok(())
    }
}

/// The dependency-ordered execution driver.
pub struct Pipeline {
    store: Arc<ProviderStore>,
    state: StateStore,
    executor: Arc<dyn NodeExecutor>,
}

impl Pipeline {
    pub fn new(store: Arc<ProviderStore>, state: StateStore) -> Self {
        Self {
            store,
            state,
            executor: Arc::new(TerraformExecutor::new()),
        }
    }

    /// Swap the backend executor (dependency injection for tests and
    /// alternative backends).
    pub fn with_executor(mut self, executor: Arc<dyn NodeExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Diff every node against durable state without touching any backend.
    pub async fn plan(&self, graph: &CloudGraph) -> Result<ExecutionPlan> {
        let order = graph.topological_order()?;
        let document = self.state.load().await?;

        // Planning resolves references from recorded outputs where it can;
        // a dependency that does not exist yet resolves to a placeholder,
        // which correctly reads as "changed".
        let mut known_outputs: HashMap<String, OutputMap> = HashMap::new();
        for (id, record) in &document.records {
            if let Some(name) = id.split('/').nth(1) {
                known_outputs.insert(name.to_string(), record.outputs.clone());
            }
        }

        let mut actions = Vec::new();
        for name in &order {
            let node = graph.node(name).expect("ordered node exists");
            let resolved = resolve_inputs_lenient(&node.descriptor, &known_outputs);
            let action = decide_action(node, &resolved, document.get(&node.id()));

            // Synthesis is backend-free, so a scratch scope is enough to
            // collect the module's display labels for rendering.
            let mut display = Vec::new();
            if action != ActionType::NoOp {
                if let Some(provider) = self.store.get(&node.descriptor.account) {
                    if let Ok(service) = provider.service(node.descriptor.kind) {
                        let mut scratch = Stack::new();
                        service.configure_terraform_providers(&mut scratch);
                        let secrets = RandomSecrets::new();
                        if let Ok(module) =
                            service.plan_module(&mut scratch, &node.id(), &resolved, &secrets)
                        {
                            display = module.display_names().values().cloned().collect();
                        }
                    }
                }
            }

            actions.push(PlanAction {
                name: name.clone(),
                kind: node.descriptor.kind,
                provider: node.descriptor.account.clone(),
                action,
                display,
            });
        }

        let live_ids: Vec<String> = graph.nodes().map(|n| n.id()).collect();
        for orphan in document.orphans(&live_ids) {
            let Some(record) = document.get(&orphan) else { continue };
            actions.push(PlanAction {
                name: orphan.clone(),
                kind: record.kind,
                provider: record.provider_name.clone(),
                action: ActionType::Delete,
                display: Vec::new(),
            });
        }

        Ok(ExecutionPlan::new(actions))
    }

    /// Apply the graph: dependency-ordered, bounded-concurrency, with
    /// partial-failure isolation. Returns a per-node report, never a
    /// single boolean.
    pub async fn apply(&self, mut graph: CloudGraph, options: PipelineOptions) -> Result<RunReport> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let run_start = Instant::now();
        let order = graph.topological_order()?;

        self.store.freeze_for_run();
        let lock = self.state.acquire_lock(&run_id).await?;
        let mut document = self.state.load().await?;

        // Resolve every provider up front; a missing binding aborts the run
        // before any external call.
        let mut providers: HashMap<String, Arc<dyn CloudProvider>> = HashMap::new();
        for node in graph.nodes() {
            let account = &node.descriptor.account;
            if !providers.contains_key(account) {
                providers.insert(account.clone(), self.store.require(account)?);
            }
        }

        // Credential gating: a provider whose credentials fail the live
        // check blocks every node bound to it from entering Applying.
        let mut bad_accounts: HashMap<String, String> = HashMap::new();
        for (account, provider) in &providers {
            match provider.test_credentials().await {
                Ok(true) => {}
                Ok(false) => {
                    bad_accounts.insert(
                        account.clone(),
                        format!("credential check failed for provider {account}"),
                    );
                }
                Err(e) => {
                    bad_accounts.insert(account.clone(), e.to_string());
                }
            }
        }

        let mut cancel = options.cancel.clone();
        let mut cancelled = cancel
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false);

        let mut outputs: HashMap<String, OutputMap> = HashMap::new();
        let mut actions: HashMap<String, ActionType> = HashMap::new();
        let mut durations: HashMap<String, u64> = HashMap::new();
        let mut resolved_cache: HashMap<String, OutputMap> = HashMap::new();
        let mut in_flight: HashSet<String> = HashSet::new();
        let mut running: JoinSet<(String, std::result::Result<AppliedNode, String>, u64)> =
            JoinSet::new();

        loop {
            if !cancelled {
                // Start everything whose dependencies are satisfied, up to
                // the concurrency bound. No-ops complete inline, so keep
                // scanning until nothing changes.
                loop {
                    let mut progressed = false;
                    let ready = ready_nodes(&graph, &order, &in_flight);
                    for name in ready {
                        if in_flight.len() >= options.concurrency {
                            break;
                        }

                        let node = graph.node(&name).expect("ready node exists");
                        let descriptor = node.descriptor.clone();
                        let id = node.id();
                        let account = descriptor.account.clone();

                        if let Some(reason) = bad_accounts.get(&account) {
                            let reason = reason.clone();
                            fail_node(&mut graph, &name, &reason);
                            progressed = true;
                            continue;
                        }

                        graph.node_mut(&name).expect("node").state = NodeState::Diffing;

                        let resolved = match resolve_inputs(&descriptor, &outputs_for(&graph, &outputs, &descriptor)) {
                            Ok(resolved) => resolved,
                            Err(e) => {
                                fail_node(&mut graph, &name, &e.to_string());
                                progressed = true;
                                continue;
                            }
                        };

                        let record = document.get(&id);
                        let action = decide_action(node_ref(&graph, &name), &resolved, record);
                        actions.insert(name.clone(), action);

                        if action == ActionType::NoOp {
                            // Idempotence: no semantic difference, zero
                            // backend calls. Outputs come from the record.
                            let recorded = record.map(|r| r.outputs.clone()).unwrap_or_default();
                            outputs.insert(name.clone(), recorded.clone());
                            graph.node_mut(&name).expect("node").mark_applied(recorded);
                            durations.insert(name.clone(), 0);
                            progressed = true;
                            continue;
                        }

                        resolved_cache.insert(name.clone(), resolved.clone());
                        let ctx = ApplyContext {
                            provider: providers[&account].clone(),
                            kind: descriptor.kind,
                            node_id: id.clone(),
                            resolved_inputs: resolved,
                            action,
                            external_id: descriptor.external_id.clone(),
                            prior_state: record.and_then(|r| r.terraform_state.clone()),
                            workdir: self.state.workdir(&id),
                            timeout: options.call_timeout,
                        };

                        graph.node_mut(&name).expect("node").state = NodeState::Applying;
                        tracing::info!("Applying {id} ({action})");
                        in_flight.insert(name.clone());
                        progressed = true;

                        let executor = self.executor.clone();
                        let task_name = name.clone();
                        running.spawn(async move {
                            let start = Instant::now();
                            let result = executor
                                .apply(ctx)
                                .await
                                .map_err(|e| e.to_string());
                            (task_name, result, start.elapsed().as_millis() as u64)
                        });
                    }

                    if !progressed {
                        break;
                    }
                }
            }

            if in_flight.is_empty() {
                break;
            }

            let mut watch_dead = false;
            let joined = match &mut cancel {
                Some(rx) => {
                    tokio::select! {
                        joined = running.join_next() => joined,
                        changed = rx.changed() => {
                            match changed {
                                Ok(()) if *rx.borrow() => {
                                    cancelled = true;
                                    running.abort_all();
                                    for name in in_flight.drain() {
                                        fail_node(&mut graph, &name, "run cancelled");
                                    }
                                }
                                Ok(()) => {}
                                // Sender gone; stop watching so the select
                                // does not spin on a dead channel.
                                Err(_) => watch_dead = true,
                            }
                            None
                        }
                    }
                }
                None => running.join_next().await,
            };
            if watch_dead {
                cancel = None;
            }

            let Some(joined) = joined else { continue };
            let Ok((name, result, duration)) = joined else {
                // A task only panics/aborts under cancellation, which is
                // handled above.
                continue;
            };

            in_flight.remove(&name);
            durations.insert(name.clone(), duration);
            let resolved = resolved_cache.remove(&name).unwrap_or_default();

            match result {
                Ok(applied) => {
                    let node = graph.node(&name).expect("node");
                    let id = node.id();
                    let descriptor = &node.descriptor;
                    let now = Utc::now();
                    let created_at = document
                        .get(&id)
                        .map(|r| r.created_at)
                        .unwrap_or(now);

                    document.set(
                        id.clone(),
                        StateRecord {
                            kind: descriptor.kind,
                            provider_name: descriptor.account.clone(),
                            inputs_hash: inputs_hash(&resolved),
                            inputs: resolved,
                            outputs: applied.outputs.clone(),
                            terraform_state: applied.terraform_state,
                            created_at,
                            updated_at: now,
                        },
                    );
                    // Persist after every success so a failed run can be
                    // retried from where it stopped.
                    self.state.save(&document).await?;

                    outputs.insert(name.clone(), applied.outputs.clone());
                    graph.node_mut(&name).expect("node").mark_applied(applied.outputs);
                    tracing::info!("Applied {id}");
                }
                Err(error) => {
                    fail_node(&mut graph, &name, &error);
                }
            }
        }

        if cancelled {
            for name in order.iter() {
                let node = graph.node_mut(name).expect("node");
                if !node.state.is_terminal() {
                    node.mark_skipped("run cancelled");
                }
            }
        }

        // Remove state records whose descriptors are gone.
        let mut orphan_reports = Vec::new();
        if options.prune && !cancelled {
            let live_ids: Vec<String> = graph.nodes().map(|n| n.id()).collect();
            for orphan in document.orphans(&live_ids) {
                let Some(record) = document.get(&orphan).cloned() else { continue };
                let start = Instant::now();
                let report = match self.destroy_record(&orphan, &record, &providers, &options).await {
                    Ok(()) => {
                        document.remove(&orphan);
                        self.state.save(&document).await?;
                        NodeReport {
                            name: orphan.clone(),
                            kind: record.kind,
                            provider: record.provider_name.clone(),
                            action: ActionType::Delete,
                            state: NodeState::Destroyed,
                            error: None,
                            duration_ms: start.elapsed().as_millis() as u64,
                        }
                    }
                    Err(e) => NodeReport {
                        name: orphan.clone(),
                        kind: record.kind,
                        provider: record.provider_name.clone(),
                        action: ActionType::Delete,
                        state: NodeState::Failed,
                        error: Some(e.to_string()),
                        duration_ms: start.elapsed().as_millis() as u64,
                    },
                };
                orphan_reports.push(report);
            }
        }

        self.state.save(&document).await?;
        lock.release().await?;

        let mut report = RunReport::new(run_id);
        for name in &order {
            let node = graph.node(name).expect("node");
            report.nodes.push(NodeReport {
                name: name.clone(),
                kind: node.descriptor.kind,
                provider: node.descriptor.account.clone(),
                action: actions.get(name).copied().unwrap_or(ActionType::NoOp),
                state: node.state,
                error: node.error.clone(),
                duration_ms: durations.get(name).copied().unwrap_or(0),
            });
        }
        report.nodes.extend(orphan_reports);
        report.duration_ms = run_start.elapsed().as_millis() as u64;
        Ok(report)
    }

    /// Tear the graph down in reverse topological order: nodes with no
    /// remaining dependents first.
    pub async fn destroy(&self, mut graph: CloudGraph, options: PipelineOptions) -> Result<RunReport> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let run_start = Instant::now();
        let mut order = graph.topological_order()?;
        order.reverse();

        self.store.freeze_for_run();
        let lock = self.state.acquire_lock(&run_id).await?;
        let mut document = self.state.load().await?;

        let mut providers: HashMap<String, Arc<dyn CloudProvider>> = HashMap::new();
        for node in graph.nodes() {
            let account = &node.descriptor.account;
            if !providers.contains_key(account) {
                providers.insert(account.clone(), self.store.require(account)?);
            }
        }

        let mut report = RunReport::new(run_id);
        for name in &order {
            let node = graph.node(name).expect("node");
            let id = node.id();

            // Skip a dependency while any of its dependents failed to tear
            // down; destroying underneath them would orphan live resources.
            let dependents_failed = graph
                .transitive_dependents(name)
                .iter()
                .any(|dependent| {
                    graph
                        .node(dependent)
                        .map(|n| n.state == NodeState::Failed)
                        .unwrap_or(false)
                });
            if dependents_failed {
                graph
                    .node_mut(name)
                    .expect("node")
                    .mark_skipped("dependent failed to destroy");
                report.nodes.push(node_report(&graph, name, ActionType::Delete, 0));
                continue;
            }

            let Some(record) = document.get(&id).cloned() else {
                graph
                    .node_mut(name)
                    .expect("node")
                    .mark_skipped("not in state");
                report.nodes.push(node_report(&graph, name, ActionType::Delete, 0));
                continue;
            };

            let start = Instant::now();
            let result = self
                .destroy_record(&id, &record, &providers, &options)
                .await;
            let duration = start.elapsed().as_millis() as u64;

            match result {
                Ok(()) => {
                    document.remove(&id);
                    self.state.save(&document).await?;
                    let node = graph.node_mut(name).expect("node");
                    node.state = NodeState::Destroyed;
                    tracing::info!("Destroyed {id}");
                }
                Err(e) => {
                    fail_node(&mut graph, name, &e.to_string());
                }
            }
            report.nodes.push(node_report(&graph, name, ActionType::Delete, duration));
        }

        self.state.save(&document).await?;
        lock.release().await?;

        report.duration_ms = run_start.elapsed().as_millis() as u64;
        Ok(report)
    }

    async fn destroy_record(
        &self,
        id: &str,
        record: &StateRecord,
        providers: &HashMap<String, Arc<dyn CloudProvider>>,
        options: &PipelineOptions,
    ) -> Result<()> {
        let provider = match providers.get(&record.provider_name) {
            Some(provider) => provider.clone(),
            None => self.store.require(&record.provider_name)?,
        };

        self.executor
            .destroy(DestroyContext {
                provider,
                kind: record.kind,
                node_id: id.to_string(),
                resolved_inputs: record.inputs.clone(),
                prior_state: record.terraform_state.clone(),
                workdir: self.state.workdir(id),
                timeout: options.call_timeout,
            })
            .await
    }
}

/// Nodes whose dependencies are all applied and which have not started yet.
fn ready_nodes(graph: &CloudGraph, order: &[String], in_flight: &HashSet<String>) -> Vec<String> {
    order
        .iter()
        .filter(|name| {
            let node = graph.node(name).expect("ordered node exists");
            if node.state != NodeState::Pending || in_flight.contains(*name) {
                return false;
            }
            graph.dependencies(name).iter().all(|dep| {
                graph
                    .node(dep)
                    .map(|n| n.state == NodeState::Applied)
                    .unwrap_or(false)
            })
        })
        .cloned()
        .collect()
}

/// Mark a node failed and skip everything that transitively depends on it.
fn fail_node(graph: &mut CloudGraph, name: &str, error: &str) {
    tracing::warn!("Node {name} failed: {error}");
    graph.node_mut(name).expect("node").mark_failed(error);
    for dependent in graph.transitive_dependents(name) {
        let node = graph.node_mut(&dependent).expect("dependent");
        if !node.state.is_terminal() {
            node.mark_skipped(format!("dependency {name} failed"));
        }
    }
}

fn node_ref<'a>(graph: &'a CloudGraph, name: &str) -> &'a crate::node::ExecutionNode {
    graph.node(name).expect("node")
}

fn node_report(graph: &CloudGraph, name: &str, action: ActionType, duration_ms: u64) -> NodeReport {
    let node = graph.node(name).expect("node");
    NodeReport {
        name: name.to_string(),
        kind: node.descriptor.kind,
        provider: node.descriptor.account.clone(),
        action,
        state: node.state,
        error: node.error.clone(),
        duration_ms,
    }
}

/// Outputs of a descriptor's direct dependencies, keyed by name.
fn outputs_for(
    graph: &CloudGraph,
    outputs: &HashMap<String, OutputMap>,
    descriptor: &cloudplane_core::ResourceDescriptor,
) -> HashMap<String, OutputMap> {
    let mut map = HashMap::new();
    for dep in graph.dependencies(&descriptor.name) {
        if let Some(found) = outputs.get(&dep) {
            map.insert(dep, found.clone());
        }
    }
    map
}

/// Planning-time resolution: unresolvable references become a placeholder,
/// which reads as a semantic change.
fn resolve_inputs_lenient(
    descriptor: &cloudplane_core::ResourceDescriptor,
    known_outputs: &HashMap<String, OutputMap>,
) -> OutputMap {
    let mut resolved = OutputMap::new();
    for (key, value) in &descriptor.inputs {
        match value {
            cloudplane_core::InputValue::Literal(literal) => {
                resolved.insert(key.clone(), literal.clone());
            }
            cloudplane_core::InputValue::Ref(reference) => {
                let substituted = known_outputs
                    .get(&reference.resource)
                    .and_then(|outputs| outputs.get(&reference.output))
                    .cloned()
                    .unwrap_or_else(|| serde_json::Value::String("(known after apply)".to_string()));
                resolved.insert(key.clone(), substituted);
            }
        }
    }
    resolved
}
