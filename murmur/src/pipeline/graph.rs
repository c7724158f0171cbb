//! Dependency graph over node indices.

use crate::errors::CycleDetectedError;
use std::collections::{BTreeSet, HashMap};

/// Dependency edges between nodes, keyed by declaration index.
///
/// `dependencies[i]` holds the nodes node `i` reads from. Neighbour sets are
/// ordered by declaration index so every traversal is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    names: Vec<String>,
    index: HashMap<String, usize>,
    dependencies: Vec<BTreeSet<usize>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

impl DependencyGraph {
    /// Creates a graph with the given nodes and no edges.
    ///
    /// Names must be unique; a repeated name keeps its first index.
    #[must_use]
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        let dependencies = vec![BTreeSet::new(); names.len()];
        Self {
            names,
            index,
            dependencies,
        }
    }

    /// Records that `node` reads from `dependency`. Unknown names are ignored.
    pub fn add_dependency(&mut self, node: &str, dependency: &str) {
        if let (Some(&from), Some(&to)) = (self.index.get(node), self.index.get(dependency)) {
            self.dependencies[from].insert(to);
        }
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns node names in declaration order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the declaration index of a node.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Returns the name at a declaration index.
    #[must_use]
    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    /// Returns the indices a node reads from.
    #[must_use]
    pub fn dependencies_of(&self, index: usize) -> &BTreeSet<usize> {
        &self.dependencies[index]
    }

    /// Returns the names a node reads from, in declaration order.
    #[must_use]
    pub fn dependency_names(&self, name: &str) -> Vec<&str> {
        self.index_of(name)
            .map(|i| self.dependencies[i].iter().map(|&d| self.name(d)).collect())
            .unwrap_or_default()
    }

    /// Returns true if `node` reads directly from `dependency`.
    #[must_use]
    pub fn depends_on(&self, node: &str, dependency: &str) -> bool {
        match (self.index_of(node), self.index_of(dependency)) {
            (Some(from), Some(to)) => self.dependencies[from].contains(&to),
            _ => false,
        }
    }

    /// Finds a dependency cycle with a three-color depth-first search.
    ///
    /// Roots and neighbours are visited in declaration order. The returned
    /// path repeats its first node at the end, and each consecutive pair is
    /// an edge from a node to one of its dependencies.
    ///
    /// # Errors
    ///
    /// Returns `CycleDetectedError` for the first cycle found.
    pub fn check_acyclic(&self) -> Result<(), CycleDetectedError> {
        let mut colors = vec![Color::White; self.len()];

        for root in 0..self.len() {
            if colors[root] == Color::White {
                if let Some(cycle) = self.visit(root, &mut colors) {
                    return Err(CycleDetectedError::new(
                        cycle.into_iter().map(|i| self.names[i].clone()).collect(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Walks everything reachable from `root` with an explicit frame stack.
    ///
    /// Each frame is a gray node and the iterator over its remaining
    /// neighbours, so the stack is also the current path.
    fn visit(&self, root: usize, colors: &mut [Color]) -> Option<Vec<usize>> {
        colors[root] = Color::Gray;
        let mut stack = vec![(root, self.dependencies[root].iter())];

        while let Some((node, neighbours)) = stack.last_mut() {
            let node = *node;
            let Some(&next) = neighbours.next() else {
                colors[node] = Color::Black;
                stack.pop();
                continue;
            };

            match colors[next] {
                Color::Gray => {
                    let start = stack.iter().position(|&(p, _)| p == next).unwrap_or(0);
                    let mut cycle: Vec<usize> = stack[start..].iter().map(|&(p, _)| p).collect();
                    cycle.push(next);
                    return Some(cycle);
                }
                Color::White => {
                    colors[next] = Color::Gray;
                    stack.push((next, self.dependencies[next].iter()));
                }
                Color::Black => {}
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(names: &[&str], edges: &[(&str, &str)]) -> DependencyGraph {
        let mut graph = DependencyGraph::new(names.iter().copied());
        for (node, dep) in edges {
            graph.add_dependency(node, dep);
        }
        graph
    }

    #[test]
    fn test_dependency_queries() {
        let g = graph(&["a", "b", "c"], &[("c", "b"), ("c", "a")]);

        assert_eq!(g.dependency_names("c"), vec!["a", "b"]);
        assert!(g.depends_on("c", "a"));
        assert!(!g.depends_on("a", "c"));
        assert_eq!(g.index_of("b"), Some(1));
        assert!(g.dependency_names("missing").is_empty());
    }

    #[test]
    fn test_acyclic_graph_passes() {
        let g = graph(&["a", "b", "c", "d"], &[("b", "a"), ("c", "a"), ("d", "b"), ("d", "c")]);
        assert!(g.check_acyclic().is_ok());
    }

    #[test]
    fn test_two_node_cycle() {
        let g = graph(&["a", "b"], &[("a", "b"), ("b", "a")]);

        let err = g.check_acyclic().unwrap_err();
        assert_eq!(err.cycle_path, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_self_reference_is_cycle() {
        let g = graph(&["a"], &[("a", "a")]);
        assert_eq!(g.check_acyclic().unwrap_err().cycle_path, vec!["a", "a"]);
    }

    #[test]
    fn test_cycle_path_excludes_entry_prefix() {
        let g = graph(&["entry", "x", "y", "z"], &[("entry", "x"), ("x", "y"), ("y", "z"), ("z", "x")]);

        let cycle = g.check_acyclic().unwrap_err().cycle_path;
        assert_eq!(cycle, vec!["x", "y", "z", "x"]);
        for pair in cycle.windows(2) {
            assert!(g.depends_on(&pair[0], &pair[1]));
        }
    }

    fn reverse_chain(len: usize) -> DependencyGraph {
        let names: Vec<String> = (0..len).map(|i| format!("n{i}")).collect();
        let mut g = DependencyGraph::new(names.iter().cloned());
        for pair in names.windows(2) {
            g.add_dependency(&pair[0], &pair[1]);
        }
        g
    }

    #[test]
    fn test_deep_chain_declared_in_reverse() {
        let g = reverse_chain(100_000);
        assert!(g.check_acyclic().is_ok());
    }

    #[test]
    fn test_deep_ring_reports_whole_path() {
        let mut g = reverse_chain(100_000);
        g.add_dependency("n99999", "n0");

        let cycle = g.check_acyclic().unwrap_err().cycle_path;
        assert_eq!(cycle.len(), 100_001);
        assert_eq!(cycle.first().map(String::as_str), Some("n0"));
        assert_eq!(cycle.last().map(String::as_str), Some("n0"));
        assert_eq!(cycle[99_999], "n99999");
    }
}
