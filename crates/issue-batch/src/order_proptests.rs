//! Property-based tests for ordering invariants
//!
//! Batches are generated as random DAGs: an issue may only depend on issues
//! generated before it and may only block issues generated after it, and the
//! whole batch is then shuffled so file order is unrelated to the DAG.

use super::*;
use crate::domain::Issue;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

// Generator for acyclic batches of up to `max` issues
fn acyclic_batch(max: usize) -> impl Strategy<Value = Vec<Issue>> {
    (1..=max)
        .prop_flat_map(|n| {
            (
                Just(n),
                prop::collection::vec(prop::collection::vec(any::<bool>(), n), n),
                prop::collection::vec(any::<bool>(), n * n),
                Just((0..n).collect::<Vec<usize>>()).prop_shuffle(),
            )
        })
        .prop_map(|(n, edges, use_blocks, file_order)| {
            let id = |i: usize| format!("I-{}", i);
            let mut issues: Vec<Issue> = (0..n).map(|i| Issue::new(id(i), "t")).collect();
            // Edge i -> j (i < j) means j must come after i.
            for i in 0..n {
                for j in (i + 1)..n {
                    if !edges[i][j] {
                        continue;
                    }
                    if use_blocks[i * n + j] {
                        issues[i].blocks.push(id(j));
                    } else {
                        issues[j].depends_on.push(id(i));
                    }
                }
            }
            file_order.into_iter().map(|i| issues[i].clone()).collect()
        })
}

fn positions(ordered: &[&Issue]) -> HashMap<String, usize> {
    ordered
        .iter()
        .enumerate()
        .map(|(pos, issue)| (issue.id.clone(), pos))
        .collect()
}

proptest! {
    /// Property: ordering is a permutation of the input
    #[test]
    fn prop_order_is_permutation(issues in acyclic_batch(12)) {
        let ordered = creation_order(&issues).unwrap();
        prop_assert_eq!(ordered.len(), issues.len());

        let seen: HashSet<&str> = ordered.iter().map(|i| i.id.as_str()).collect();
        prop_assert_eq!(seen.len(), issues.len());
    }

    /// Property: every depends_on and blocks edge is respected
    #[test]
    fn prop_order_respects_edges(issues in acyclic_batch(12)) {
        let ordered = creation_order(&issues).unwrap();
        let pos = positions(&ordered);

        for issue in &issues {
            for dep in &issue.depends_on {
                prop_assert!(pos[dep] < pos[&issue.id]);
            }
            for blocked in &issue.blocks {
                prop_assert!(pos[&issue.id] < pos[blocked]);
            }
        }
    }

    /// Property: ordering the same batch twice gives the same sequence
    #[test]
    fn prop_order_is_idempotent(issues in acyclic_batch(12)) {
        let first: Vec<&str> = creation_order(&issues)
            .unwrap()
            .into_iter()
            .map(|i| i.id.as_str())
            .collect();
        let second: Vec<&str> = creation_order(&issues)
            .unwrap()
            .into_iter()
            .map(|i| i.id.as_str())
            .collect();
        prop_assert_eq!(first, second);
    }

    /// Property: a batch without edges keeps file order
    #[test]
    fn prop_unconstrained_batch_keeps_file_order(n in 0usize..20) {
        let issues: Vec<Issue> = (0..n).map(|i| Issue::new(format!("I-{}", i), "t")).collect();
        let ordered = creation_order(&issues).unwrap();
        let ids: Vec<&str> = ordered.iter().map(|i| i.id.as_str()).collect();
        let expected: Vec<&str> = issues.iter().map(|i| i.id.as_str()).collect();
        prop_assert_eq!(ids, expected);
    }

    /// Property: each emitted issue is the earliest-positioned one that was
    /// ready at that step
    #[test]
    fn prop_order_is_stable(issues in acyclic_batch(10)) {
        let ordered = creation_order(&issues).unwrap();
        let file_pos: HashMap<&str, usize> = issues
            .iter()
            .enumerate()
            .map(|(pos, issue)| (issue.id.as_str(), pos))
            .collect();

        let mut predecessors: HashMap<&str, Vec<&str>> = HashMap::new();
        for issue in &issues {
            for dep in &issue.depends_on {
                predecessors.entry(issue.id.as_str()).or_default().push(dep.as_str());
            }
            for blocked in &issue.blocks {
                predecessors.entry(blocked.as_str()).or_default().push(issue.id.as_str());
            }
        }

        let mut placed: HashSet<&str> = HashSet::new();
        for emitted in &ordered {
            let ready_min = issues
                .iter()
                .filter(|i| !placed.contains(i.id.as_str()))
                .filter(|i| {
                    predecessors
                        .get(i.id.as_str())
                        .map_or(true, |preds| preds.iter().all(|p| placed.contains(p)))
                })
                .map(|i| file_pos[i.id.as_str()])
                .min();
            prop_assert_eq!(ready_min, Some(file_pos[emitted.id.as_str()]));
            placed.insert(emitted.id.as_str());
        }
    }

    /// Property: original order never reorders a batch with valid references
    #[test]
    fn prop_original_order_is_identity(issues in acyclic_batch(12)) {
        let ordered = original_order(&issues).unwrap();
        for (got, expected) in ordered.iter().zip(&issues) {
            prop_assert!(std::ptr::eq(*got, expected));
        }
    }
}
