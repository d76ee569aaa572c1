//! Creation ordering for issue batches.
//!
//! Two modes are supported:
//!
//! - [`OrderMode::Dependency`] validates the batch and returns a stable
//!   topological order over `depends_on` and `blocks` edges.
//! - [`OrderMode::Original`] keeps file order and only checks that every
//!   referenced ID exists.
//!
//! The dependency order is a stable variant of Kahn's algorithm: whenever
//! several nodes are ready, the one with the smallest original position is
//! emitted first. Nodes with no outstanding constraints therefore stay as
//! close to their file position as the graph permits.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use tracing::debug;

use crate::graph::{DependencyGraph, GraphError, GraphNode};

/// How a batch should be ordered before creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderMode {
    /// Respect `depends_on` and `blocks` constraints.
    #[default]
    Dependency,
    /// Keep file order; references are still checked.
    Original,
}

impl fmt::Display for OrderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderMode::Dependency => f.write_str("dependency order"),
            OrderMode::Original => f.write_str("file order"),
        }
    }
}

/// Order `items` according to `mode`.
pub fn order<T: GraphNode>(items: &[T], mode: OrderMode) -> Result<Vec<&T>, GraphError> {
    match mode {
        OrderMode::Dependency => creation_order(items),
        OrderMode::Original => original_order(items),
    }
}

/// Validate the batch and return it in stable dependency order.
///
/// For every `depends_on` edge (A depends on B) B precedes A, and for every
/// `blocks` edge (A blocks C) A precedes C. Fails without returning a partial
/// order if validation fails or a `blocks` conflict leaves nodes unplaced.
pub fn creation_order<T: GraphNode>(items: &[T]) -> Result<Vec<&T>, GraphError> {
    let refs: Vec<&T> = items.iter().collect();
    let graph = DependencyGraph::new(&refs)?;
    graph.validate()?;
    stable_topological_order(&graph)
}

/// Return the batch unchanged after checking that every reference resolves.
///
/// `depends_on` cycles are not rejected here since file order never relies
/// on acyclicity.
pub fn original_order<T: GraphNode>(items: &[T]) -> Result<Vec<&T>, GraphError> {
    let refs: Vec<&T> = items.iter().collect();
    let graph = DependencyGraph::new(&refs)?;
    graph.validate_references()?;
    Ok(refs)
}

fn stable_topological_order<'a, T: GraphNode>(
    graph: &DependencyGraph<'a, T>,
) -> Result<Vec<&'a T>, GraphError> {
    let nodes = graph.nodes();
    let mut in_degree = vec![0usize; nodes.len()];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];

    for (pos, node) in nodes.iter().enumerate() {
        // A depends on B: B -> A
        for dep in node.dependencies() {
            let Some(dep_pos) = graph.position(dep) else {
                continue;
            };
            successors[dep_pos].push(pos);
            in_degree[pos] += 1;
        }

        // A blocks C: A -> C
        for blocked in node.blocks() {
            let Some(blocked_pos) = graph.position(blocked) else {
                continue;
            };
            successors[pos].push(blocked_pos);
            in_degree[blocked_pos] += 1;
        }
    }

    // Min-heap on original position: the ready set always yields the
    // earliest-positioned node.
    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(pos, _)| Reverse(pos))
        .collect();
    let mut emitted = vec![false; nodes.len()];
    let mut ordered = Vec::with_capacity(nodes.len());

    while let Some(Reverse(pos)) = ready.pop() {
        emitted[pos] = true;
        ordered.push(nodes[pos]);
        debug!(id = nodes[pos].id(), position = pos, "emitted");

        for &next in &successors[pos] {
            if in_degree[next] == 0 {
                continue;
            }
            in_degree[next] -= 1;
            if in_degree[next] == 0 && !emitted[next] {
                ready.push(Reverse(next));
            }
        }
    }

    if ordered.len() != nodes.len() {
        let unplaced: Vec<String> = nodes
            .iter()
            .zip(&emitted)
            .filter(|(_, done)| !**done)
            .map(|(node, _)| node.id().to_string())
            .collect();
        debug!(unplaced = unplaced.len(), "ordering stalled");
        return Err(GraphError::UnresolvableGraph { unplaced });
    }

    Ok(ordered)
}

#[cfg(test)]
#[path = "order_proptests.rs"]
mod proptests;
