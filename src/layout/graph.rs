//! Ordering dependencies created by relationship constraints.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::constraint::ConstraintSet;
use crate::error::{LayoutError, Result};

/// Directed "placed before" graph over component indices.
#[derive(Debug)]
pub(crate) struct DependencyGraph {
    successors: Vec<Vec<usize>>,
    in_degree: Vec<usize>,
}

impl DependencyGraph {
    /// Build the graph for components given in registration order.
    pub(crate) fn build(components: &[(&str, &ConstraintSet)]) -> Result<Self> {
        let index: HashMap<&str, usize> = components
            .iter()
            .enumerate()
            .map(|(idx, (id, _))| (*id, idx))
            .collect();

        let mut graph = Self {
            successors: vec![Vec::new(); components.len()],
            in_degree: vec![0; components.len()],
        };

        for (owner, (id, constraints)) in components.iter().enumerate() {
            for rel in constraints.relationships() {
                let target = *index.get(rel.target()).ok_or_else(|| LayoutError::UnknownTarget {
                    component: id.to_string(),
                    target: rel.target().to_string(),
                })?;
                if rel.target_first() {
                    graph.add_edge(target, owner);
                } else {
                    graph.add_edge(owner, target);
                }
            }
        }

        Ok(graph)
    }

    fn add_edge(&mut self, before: usize, after: usize) {
        self.successors[before].push(after);
        self.in_degree[after] += 1;
    }

    /// Kahn's algorithm. Ready nodes are released lowest index first so
    /// unrelated components keep registration order.
    ///
    /// On a cycle, returns the indices that could never be released.
    pub(crate) fn topological_order(&self) -> std::result::Result<Vec<usize>, Vec<usize>> {
        let mut in_degree = self.in_degree.clone();
        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(idx, _)| Reverse(idx))
            .collect();

        let mut order = Vec::with_capacity(in_degree.len());
        while let Some(Reverse(node)) = ready.pop() {
            order.push(node);
            for &next in &self.successors[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if order.len() < in_degree.len() {
            let stuck = in_degree
                .iter()
                .enumerate()
                .filter(|(_, degree)| **degree > 0)
                .map(|(idx, _)| idx)
                .collect();
            return Err(stuck);
        }
        Ok(order)
    }
}
