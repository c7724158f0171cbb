//! Topological scheduling.

use super::graph::DependencyGraph;
use crate::errors::MurmurError;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Produces an execution order with Kahn's algorithm.
///
/// Every node appears once, after all of its dependencies. Among nodes that
/// are ready at the same time, the earliest declared runs first.
///
/// # Errors
///
/// Returns `MurmurError::Internal` if some nodes could not be ordered. A
/// validated graph is acyclic, so this indicates a validator defect.
pub fn schedule(graph: &DependencyGraph) -> Result<Vec<String>, MurmurError> {
    let n = graph.len();
    let mut remaining: Vec<usize> = (0..n).map(|i| graph.dependencies_of(i).len()).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for node in 0..n {
        for &dep in graph.dependencies_of(node) {
            dependents[dep].push(node);
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = remaining
        .iter()
        .enumerate()
        .filter(|(_, &count)| count == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(n);
    while let Some(Reverse(node)) = ready.pop() {
        order.push(graph.name(node).to_string());
        for &dependent in &dependents[node] {
            remaining[dependent] -= 1;
            if remaining[dependent] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }

    if order.len() < n {
        let unscheduled: Vec<&str> = (0..n)
            .filter(|&i| remaining[i] > 0)
            .map(|i| graph.name(i))
            .collect();
        return Err(MurmurError::Internal(format!(
            "scheduler could not order nodes: {}",
            unscheduled.join(", ")
        )));
    }

    Ok(order)
}
