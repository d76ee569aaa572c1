//! Dependency graph operations and validation.
//!
//! Provides referential-integrity checks and cycle detection over a batch of
//! cross-referenced nodes.
//!
//! The graph module provides a generic `DependencyGraph<T>` that works with any
//! type implementing the `GraphNode` trait. Only `depends_on` edges are checked
//! for cycles; `blocks` edges are validated for existence but any conflict
//! they introduce surfaces later, during ordering.

use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

use crate::domain::Relation;

/// Trait for types that can participate in a dependency graph
///
/// Types implementing this trait can be used with `DependencyGraph` to check
/// references, detect cycles and compute a creation order.
pub trait GraphNode {
    /// Unique identifier for this node
    fn id(&self) -> &str;

    /// IDs of nodes this node depends on
    fn dependencies(&self) -> &[String];

    /// IDs of nodes this node must precede
    fn blocks(&self) -> &[String] {
        &[]
    }

    /// IDs of nodes this node merely refers to
    fn related(&self) -> &[String] {
        &[]
    }
}

fn references<T: GraphNode>(node: &T, relation: Relation) -> &[String] {
    match relation {
        Relation::DependsOn => node.dependencies(),
        Relation::Blocks => node.blocks(),
        Relation::Related => node.related(),
    }
}

/// Errors that can occur during graph operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Two nodes in the batch share an ID
    #[error("duplicate issue ID found: {id}")]
    DuplicateId { id: String },

    /// A relationship list names an ID that is not in the batch
    #[error("issue {from} {relation} non-existent issue {to}")]
    MissingReference {
        from: String,
        relation: Relation,
        to: String,
    },

    /// The `depends_on` edges form a cycle; `from -> to` closed it
    #[error("circular dependency detected: {from} -> {to}")]
    CircularDependency { from: String, to: String },

    /// Ordering could not place every node
    #[error(
        "could not fully order issues: {} unplaced ({})",
        .unplaced.len(),
        .unplaced.join(", ")
    )]
    UnresolvableGraph { unplaced: Vec<String> },
}

/// Dependency graph over one batch with a per-call lookup index.
///
/// All methods are pure functions that do not modify the nodes.
pub struct DependencyGraph<'a, T: GraphNode> {
    nodes: Vec<&'a T>,
    index: HashMap<&'a str, usize>,
}

impl<'a, T: GraphNode> DependencyGraph<'a, T> {
    /// Create a new dependency graph from a list of nodes.
    ///
    /// The node order is the original position used for tie-breaking.
    /// Rejects batches in which two nodes share an ID.
    pub fn new(nodes: &[&'a T]) -> Result<Self, GraphError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (position, &node) in nodes.iter().enumerate() {
            if index.insert(node.id(), position).is_some() {
                return Err(GraphError::DuplicateId {
                    id: node.id().to_string(),
                });
            }
        }

        debug!(nodes = nodes.len(), "built dependency graph index");

        Ok(Self {
            nodes: nodes.to_vec(),
            index,
        })
    }

    /// Nodes in original order
    pub fn nodes(&self) -> &[&'a T] {
        &self.nodes
    }

    /// Original position of the node with the given ID
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Run every check: references first, then `depends_on` cycles.
    pub fn validate(&self) -> Result<(), GraphError> {
        self.validate_references()?;
        self.validate_dag()
    }

    /// Check that every referenced ID resolves to a node in the batch.
    ///
    /// Lists are checked per node in input order, `depends_on` before
    /// `blocks` before `related`; the first dangling ID is reported.
    pub fn validate_references(&self) -> Result<(), GraphError> {
        for &node in &self.nodes {
            for relation in Relation::ALL {
                if let Some(missing) = references(node, relation)
                    .iter()
                    .find(|target| !self.index.contains_key(target.as_str()))
                {
                    return Err(GraphError::MissingReference {
                        from: node.id().to_string(),
                        relation,
                        to: missing.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Validate that the `depends_on` subgraph is a DAG (no cycles)
    pub fn validate_dag(&self) -> Result<(), GraphError> {
        // Check for cycles using DFS
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();

        for &node in &self.nodes {
            if !visited.contains(node.id()) {
                self.check_cycle_dfs(node.id(), &mut visited, &mut rec_stack)?;
            }
        }

        Ok(())
    }

    fn check_cycle_dfs(
        &self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        rec_stack: &mut HashSet<&'a str>,
    ) -> Result<(), GraphError> {
        visited.insert(node);
        rec_stack.insert(node);

        if let Some(graph_node) = self.position(node).map(|pos| self.nodes[pos]) {
            for dep in graph_node.dependencies() {
                if !visited.contains(dep.as_str()) {
                    // Dangling IDs are leaves here; reference checks report them.
                    if let Some(pos) = self.position(dep) {
                        self.check_cycle_dfs(self.nodes[pos].id(), visited, rec_stack)?;
                    }
                } else if rec_stack.contains(dep.as_str()) {
                    return Err(GraphError::CircularDependency {
                        from: node.to_string(),
                        to: dep.clone(),
                    });
                }
            }
        }

        rec_stack.remove(node);
        Ok(())
    }

    /// Get all root nodes (nodes with no dependencies), in original order
    pub fn get_roots(&self) -> Vec<&'a T> {
        self.nodes
            .iter()
            .filter(|node| node.dependencies().is_empty())
            .copied()
            .collect()
    }

    /// Get all nodes that directly depend on the given node, in original order
    pub fn get_dependents(&self, node_id: &str) -> Vec<&'a T> {
        self.nodes
            .iter()
            .filter(|node| node.dependencies().iter().any(|dep| dep == node_id))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Issue;

    // Dummy node type for testing generic graph functionality
    #[derive(Debug, Clone)]
    struct TestNode {
        id: String,
        deps: Vec<String>,
    }

    impl TestNode {
        fn new(id: &str, deps: Vec<&str>) -> Self {
            Self {
                id: id.to_string(),
                deps: deps.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    impl GraphNode for TestNode {
        fn id(&self) -> &str {
            &self.id
        }

        fn dependencies(&self) -> &[String] {
            &self.deps
        }
    }

    fn graph_of(issues: &[Issue]) -> DependencyGraph<'_, Issue> {
        let refs: Vec<&Issue> = issues.iter().collect();
        DependencyGraph::new(&refs).unwrap()
    }

    #[test]
    fn test_generic_graph_with_test_nodes() {
        let node1 = TestNode::new("A", vec![]);
        let node2 = TestNode::new("B", vec!["A"]);
        let node3 = TestNode::new("C", vec!["B"]);

        let nodes = vec![&node1, &node2, &node3];
        let graph = DependencyGraph::new(&nodes).unwrap();

        assert!(graph.validate().is_ok());
        assert_eq!(graph.position("C"), Some(2));
    }

    #[test]
    fn test_generic_graph_cycle_detection() {
        let node1 = TestNode::new("A", vec!["B"]);
        let node2 = TestNode::new("B", vec!["A"]);

        let nodes = vec![&node1, &node2];
        let graph = DependencyGraph::new(&nodes).unwrap();

        assert_eq!(
            graph.validate_dag(),
            Err(GraphError::CircularDependency {
                from: "B".to_string(),
                to: "A".to_string()
            })
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let node1 = TestNode::new("A", vec![]);
        let node2 = TestNode::new("A", vec![]);

        let nodes = vec![&node1, &node2];
        let result = DependencyGraph::new(&nodes);

        assert_eq!(
            result.err(),
            Some(GraphError::DuplicateId {
                id: "A".to_string()
            })
        );
    }

    #[test]
    fn test_valid_dependencies() {
        let issues = vec![
            Issue::new("A", "a").with_depends_on(["B"]),
            Issue::new("B", "b"),
        ];
        assert!(graph_of(&issues).validate().is_ok());
    }

    #[test]
    fn test_missing_dependency_reported() {
        let issues = vec![Issue::new("A", "a").with_depends_on(["B"])];
        let err = graph_of(&issues).validate().unwrap_err();

        assert_eq!(
            err,
            GraphError::MissingReference {
                from: "A".to_string(),
                relation: Relation::DependsOn,
                to: "B".to_string(),
            }
        );
        assert_eq!(err.to_string(), "issue A depends on non-existent issue B");
    }

    #[test]
    fn test_missing_blocks_target_reported() {
        let issues = vec![Issue::new("A", "a").with_blocks(["Z"])];
        let err = graph_of(&issues).validate_references().unwrap_err();
        assert_eq!(err.to_string(), "issue A blocks non-existent issue Z");
    }

    #[test]
    fn test_missing_related_issue_reported() {
        let issues = vec![Issue::new("A", "a").with_related(["B"])];
        let err = graph_of(&issues).validate().unwrap_err();
        assert_eq!(err.to_string(), "issue A relates to non-existent issue B");
    }

    #[test]
    fn test_first_missing_reference_wins() {
        let issues = vec![
            Issue::new("A", "a").with_related(["R"]),
            Issue::new("B", "b").with_depends_on(["X"]),
        ];
        let err = graph_of(&issues).validate_references().unwrap_err();
        assert!(matches!(
            err,
            GraphError::MissingReference { ref from, ref to, relation: Relation::Related }
                if from == "A" && to == "R"
        ));
    }

    #[test]
    fn test_circular_dependency_detected() {
        let issues = vec![
            Issue::new("A", "a").with_depends_on(["B"]),
            Issue::new("B", "b").with_depends_on(["A"]),
        ];
        let err = graph_of(&issues).validate().unwrap_err();
        assert_eq!(err.to_string(), "circular dependency detected: B -> A");
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let issues = vec![Issue::new("A", "a").with_depends_on(["A"])];
        assert_eq!(
            graph_of(&issues).validate(),
            Err(GraphError::CircularDependency {
                from: "A".to_string(),
                to: "A".to_string()
            })
        );
    }

    #[test]
    fn test_cycle_in_disconnected_component_detected() {
        let issues = vec![
            Issue::new("A", "a"),
            Issue::new("B", "b").with_depends_on(["A"]),
            Issue::new("C", "c").with_depends_on(["E"]),
            Issue::new("D", "d").with_depends_on(["C"]),
            Issue::new("E", "e").with_depends_on(["D"]),
        ];
        assert!(matches!(
            graph_of(&issues).validate_dag(),
            Err(GraphError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_blocks_cycle_is_accepted_by_validation() {
        let issues = vec![
            Issue::new("A", "a").with_blocks(["B"]),
            Issue::new("B", "b").with_blocks(["A"]),
        ];
        assert!(graph_of(&issues).validate().is_ok());
    }

    #[test]
    fn test_diamond_graph_is_valid() {
        let issues = vec![
            Issue::new("A", "a").with_depends_on(["B", "C"]),
            Issue::new("B", "b").with_depends_on(["D"]),
            Issue::new("C", "c").with_depends_on(["D"]),
            Issue::new("D", "d"),
        ];
        assert!(graph_of(&issues).validate().is_ok());
    }

    #[test]
    fn test_reference_only_check_ignores_cycles() {
        let issues = vec![
            Issue::new("A", "a").with_depends_on(["B"]),
            Issue::new("B", "b").with_depends_on(["A"]),
        ];
        assert!(graph_of(&issues).validate_references().is_ok());
    }

    #[test]
    fn test_get_roots_returns_issues_with_no_dependencies() {
        let issues = vec![
            Issue::new("root1", "r1"),
            Issue::new("dep", "d").with_depends_on(["root1"]),
            Issue::new("root2", "r2").with_blocks(["dep"]),
        ];
        let graph = graph_of(&issues);

        let roots: Vec<&str> = graph.get_roots().into_iter().map(|i| i.id.as_str()).collect();
        assert_eq!(roots, vec!["root1", "root2"]);
    }

    #[test]
    fn test_get_dependents_in_original_order() {
        let issues = vec![
            Issue::new("late", "l").with_depends_on(["base"]),
            Issue::new("base", "b"),
            Issue::new("early", "e").with_depends_on(["base", "late"]),
            Issue::new("blocker", "x").with_blocks(["base"]),
        ];
        let graph = graph_of(&issues);

        let dependents: Vec<&str> = graph
            .get_dependents("base")
            .into_iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(dependents, vec!["late", "early"]);
        assert!(graph.get_dependents("early").is_empty());
    }

    #[test]
    fn test_unresolvable_graph_message_lists_ids() {
        let err = GraphError::UnresolvableGraph {
            unplaced: vec!["A".to_string(), "B".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "could not fully order issues: 2 unplaced (A, B)"
        );
    }
}
