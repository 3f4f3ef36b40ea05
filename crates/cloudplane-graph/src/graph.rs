//! Cloud graph construction and ordering

use crate::error::{GraphError, Result};
use crate::node::ExecutionNode;
use cloudplane_core::{validate, ResourceDescriptor};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap};

/// The desired-state graph: one node per descriptor, one edge per reference.
///
/// Construction validates every descriptor against its kind schema, checks
/// every reference target exists and names a real output, and rejects
/// cycles — all before any external call is attempted.
#[derive(Debug)]
pub struct CloudGraph {
    graph: DiGraph<ExecutionNode, ()>,
    indices: HashMap<String, NodeIndex>,
}

impl CloudGraph {
    /// Build and validate the graph from parsed descriptors.
    pub fn new(descriptors: Vec<ResourceDescriptor>) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut indices: HashMap<String, NodeIndex> = HashMap::new();

        for descriptor in descriptors {
            validate(&descriptor)?;
            let name = descriptor.name.clone();
            if indices.contains_key(&name) {
                return Err(GraphError::DuplicateNode(name));
            }
            let idx = graph.add_node(ExecutionNode::new(descriptor));
            indices.insert(name, idx);
        }

        // Edges run dependency -> dependent, so successors are the nodes
        // waiting on us.
        let mut edges = Vec::new();
        for idx in graph.node_indices() {
            let node = &graph[idx];
            for reference in node.descriptor.references() {
                let Some(&dep_idx) = indices.get(&reference.resource) else {
                    return Err(GraphError::MissingDependency {
                        from: node.name().to_string(),
                        to: reference.resource.clone(),
                    });
                };

                let dep_kind = graph[dep_idx].descriptor.kind;
                if dep_kind.output_schema().field(&reference.output).is_none() {
                    return Err(GraphError::UnknownOutput {
                        resource: reference.resource.clone(),
                        output: reference.output.clone(),
                    });
                }

                edges.push((dep_idx, idx));
            }
        }
        for (from, to) in edges {
            graph.add_edge(from, to, ());
        }

        let built = Self { graph, indices };
        built.check_cycles()?;
        Ok(built)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node(&self, name: &str) -> Option<&ExecutionNode> {
        self.indices.get(name).map(|&idx| &self.graph[idx])
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut ExecutionNode> {
        let idx = *self.indices.get(name)?;
        Some(&mut self.graph[idx])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ExecutionNode> {
        self.graph.node_indices().map(|idx| &self.graph[idx])
    }

    /// Names of the nodes `name` depends on.
    pub fn dependencies(&self, name: &str) -> Vec<String> {
        let Some(&idx) = self.indices.get(name) else {
            return Vec::new();
        };
        let mut deps: Vec<String> = self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .map(|dep| self.graph[dep].name().to_string())
            .collect();
        deps.sort();
        deps
    }

    /// Names of the nodes that depend on `name`, transitively.
    pub fn transitive_dependents(&self, name: &str) -> Vec<String> {
        let Some(&idx) = self.indices.get(name) else {
            return Vec::new();
        };

        let mut seen = BTreeSet::new();
        let mut stack: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        while let Some(current) = stack.pop() {
            if seen.insert(self.graph[current].name().to_string()) {
                stack.extend(self.graph.neighbors_directed(current, Direction::Outgoing));
            }
        }
        seen.into_iter().collect()
    }

    /// Deterministic topological order: Kahn's algorithm with ties broken
    /// by node name, ascending, so runs are reproducible.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                (
                    idx,
                    self.graph.neighbors_directed(idx, Direction::Incoming).count(),
                )
            })
            .collect();

        let mut ready: BTreeSet<(String, NodeIndex)> = in_degree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(&idx, _)| (self.graph[idx].name().to_string(), idx))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(entry) = ready.iter().next().cloned() {
            ready.remove(&entry);
            let (name, idx) = entry;
            order.push(name);

            for succ in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                let degree = in_degree.get_mut(&succ).expect("successor tracked");
                *degree -= 1;
                if *degree == 0 {
                    ready.insert((self.graph[succ].name().to_string(), succ));
                }
            }
        }

        if order.len() != self.graph.node_count() {
            // Some nodes never reached in-degree zero; report the cycle.
            return Err(self.extract_cycle());
        }
        Ok(order)
    }

    fn check_cycles(&self) -> Result<()> {
        if petgraph::algo::is_cyclic_directed(&self.graph) {
            Err(self.extract_cycle())
        } else {
            Ok(())
        }
    }

    /// Walk the graph to reconstruct a full cycle path for the error.
    fn extract_cycle(&self) -> GraphError {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut colors: HashMap<NodeIndex, Color> = self
            .graph
            .node_indices()
            .map(|idx| (idx, Color::White))
            .collect();

        // Recursive DFS kept iterative with an explicit stack of (node,
        // child iterator position).
        for start in self.graph.node_indices() {
            if colors[&start] != Color::White {
                continue;
            }

            let mut path: Vec<NodeIndex> = Vec::new();
            let mut stack: Vec<(NodeIndex, Vec<NodeIndex>)> = vec![(
                start,
                self.graph.neighbors_directed(start, Direction::Outgoing).collect(),
            )];
            colors.insert(start, Color::Gray);
            path.push(start);

            while let Some((current, children)) = stack.last_mut() {
                if let Some(child) = children.pop() {
                    match colors[&child] {
                        Color::Gray => {
                            // Found the cycle: slice the path from the
                            // first occurrence of `child`.
                            let from = path.iter().position(|&n| n == child).unwrap_or(0);
                            let mut names: Vec<String> = path[from..]
                                .iter()
                                .map(|&n| self.graph[n].name().to_string())
                                .collect();
                            names.push(self.graph[child].name().to_string());
                            return GraphError::CyclicDependency { path: names };
                        }
                        Color::White => {
                            colors.insert(child, Color::Gray);
                            path.push(child);
                            stack.push((
                                child,
                                self.graph
                                    .neighbors_directed(child, Direction::Outgoing)
                                    .collect(),
                            ));
                        }
                        Color::Black => {}
                    }
                } else {
                    colors.insert(*current, Color::Black);
                    path.pop();
                    stack.pop();
                }
            }
        }

        GraphError::CyclicDependency { path: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudplane_core::ResourceKind;
    use serde_json::json;

    fn vpc(name: &str) -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::Vpc, name, "acct")
            .with_input("name", json!(name))
            .with_input("region", json!("nyc3"))
    }

    fn database(name: &str, vpc: &str) -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::Database, name, "acct")
            .with_input("name", json!(name))
            .with_input("databaseType", json!("postgres"))
            .with_input("databaseVersion", json!("15"))
            .with_reference("vpc", vpc, "id")
    }

    fn user(name: &str, db: &str) -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::DatabaseUser, name, "acct")
            .with_input("username", json!(name))
            .with_reference("database", db, "id")
    }

    #[test]
    fn builds_edges_from_references() {
        let graph = CloudGraph::new(vec![vpc("net"), database("db", "net"), user("u", "db")])
            .unwrap();
        assert_eq!(graph.dependencies("db"), vec!["net"]);
        assert_eq!(graph.dependencies("u"), vec!["db"]);
        assert_eq!(graph.transitive_dependents("net"), vec!["db", "u"]);
    }

    #[test]
    fn topological_order_is_stable() {
        let graph = CloudGraph::new(vec![
            vpc("zeta"),
            vpc("alpha"),
            database("db", "alpha"),
        ])
        .unwrap();
        // alpha and zeta tie at in-degree zero; name order breaks the tie.
        assert_eq!(graph.topological_order().unwrap(), vec!["alpha", "zeta", "db"]);
    }

    #[test]
    fn missing_reference_target_is_rejected() {
        let err = CloudGraph::new(vec![database("db", "ghost")]).unwrap_err();
        assert!(matches!(
            err,
            GraphError::MissingDependency { from, to } if from == "db" && to == "ghost"
        ));
    }

    #[test]
    fn unknown_output_key_is_rejected() {
        let descriptor = ResourceDescriptor::new(ResourceKind::DatabaseUser, "u", "acct")
            .with_input("username", json!("u"))
            .with_reference("database", "net", "nonsense");
        let err = CloudGraph::new(vec![vpc("net"), descriptor]).unwrap_err();
        assert!(matches!(err, GraphError::UnknownOutput { output, .. } if output == "nonsense"));
    }

    #[test]
    fn cycle_is_reported_with_full_path() {
        // a -> b -> c -> a via vpc references (vpc outputs include id)
        let a = ResourceDescriptor::new(ResourceKind::Vpc, "a", "acct")
            .with_input("name", json!("a"))
            .with_input("region", json!("nyc3"))
            .with_reference("description", "c", "id");
        let b = ResourceDescriptor::new(ResourceKind::Vpc, "b", "acct")
            .with_input("name", json!("b"))
            .with_input("region", json!("nyc3"))
            .with_reference("description", "a", "id");
        let c = ResourceDescriptor::new(ResourceKind::Vpc, "c", "acct")
            .with_input("name", json!("c"))
            .with_input("region", json!("nyc3"))
            .with_reference("description", "b", "id");

        let err = CloudGraph::new(vec![a, b, c]).unwrap_err();
        let GraphError::CyclicDependency { path } = err else {
            panic!("expected CyclicDependency");
        };
        // Path closes on itself and touches all three nodes.
        assert_eq!(path.first(), path.last());
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = CloudGraph::new(vec![vpc("net"), vpc("net")]).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateNode(name) if name == "net"));
    }

    #[test]
    fn schema_violations_abort_graph_construction() {
        let bad = ResourceDescriptor::new(ResourceKind::Vpc, "net", "acct");
        assert!(matches!(
            CloudGraph::new(vec![bad]),
            Err(GraphError::Core(_))
        ));
    }
}
