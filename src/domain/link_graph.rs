//! Index-based view of the links between requirement sets.
//!
//! The catalog stores sets by name. Traversals build a [`LinkGraph`] snapshot
//! that assigns each set a dense index and resolves `links_to_sets` into
//! adjacency lists once, so the depth-first searches below work on integers.
//! Links to unknown sets are dropped from the adjacency lists; traversals treat
//! them as leaves that contribute nothing.

use std::collections::{BTreeMap, HashMap};

use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap};

use crate::domain::{Name, RequirementSet};

#[derive(Debug)]
pub struct LinkGraph<'a> {
    names: Vec<&'a Name>,
    index: HashMap<&'a str, usize>,
    /// Outgoing links per node, in declaration order, duplicates kept.
    edges: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Gray,
    Black,
}

impl<'a> LinkGraph<'a> {
    pub fn new(sets: &'a BTreeMap<Name, RequirementSet>) -> Self {
        let names: Vec<&Name> = sets.keys().collect();
        let index: HashMap<&str, usize> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let edges = sets
            .values()
            .map(|set| {
                set.links_to_sets
                    .iter()
                    .filter_map(|target| index.get(target.as_str()).copied())
                    .collect()
            })
            .collect();

        Self {
            names,
            index,
            edges,
        }
    }

    /// Depth-first post-order from `root`, each set emitted at most once.
    ///
    /// A set's linked sets are emitted before the set itself, in the order they
    /// are declared. Unknown roots yield an empty list.
    pub fn post_order(&self, root: &str) -> Vec<&'a Name> {
        let Some(&start) = self.index.get(root) else {
            return Vec::new();
        };

        let mut visited = vec![false; self.names.len()];
        let mut order = Vec::new();
        // (node, position of the next child to visit)
        let mut stack = vec![(start, 0usize)];
        visited[start] = true;

        while let Some((node, next)) = stack.last_mut() {
            let node = *node;
            if let Some(&child) = self.edges[node].get(*next) {
                *next += 1;
                if !visited[child] {
                    visited[child] = true;
                    stack.push((child, 0));
                }
            } else {
                stack.pop();
                order.push(self.names[node]);
            }
        }

        order
    }

    /// Whether a cycle is reachable from `root`.
    pub fn has_cycle_from(&self, root: &str) -> bool {
        let Some(&start) = self.index.get(root) else {
            return false;
        };
        let mut marks = vec![Mark::White; self.names.len()];
        self.visit(start, &mut marks)
    }

    /// Whether any cycle exists in the graph.
    pub fn has_cycle(&self) -> bool {
        let mut marks = vec![Mark::White; self.names.len()];
        (0..self.names.len()).any(|node| self.visit(node, &mut marks))
    }

    /// Three-colour depth-first search from `start`.
    ///
    /// Returns `true` on the first edge into a gray node. Marks persist across
    /// calls so that black nodes are never explored twice.
    fn visit(&self, start: usize, marks: &mut [Mark]) -> bool {
        match marks[start] {
            Mark::Gray => return true,
            Mark::Black => return false,
            Mark::White => {}
        }

        marks[start] = Mark::Gray;
        let mut stack = vec![(start, 0usize)];

        while let Some((node, next)) = stack.last_mut() {
            let node = *node;
            if let Some(&child) = self.edges[node].get(*next) {
                *next += 1;
                match marks[child] {
                    Mark::Gray => return true,
                    Mark::Black => {}
                    Mark::White => {
                        marks[child] = Mark::Gray;
                        stack.push((child, 0));
                    }
                }
            } else {
                marks[node] = Mark::Black;
                stack.pop();
            }
        }

        false
    }

    /// Every cycle as a sorted list of set names, sorted overall.
    pub fn cycles(&self) -> Vec<Vec<Name>> {
        let mut graph = DiGraphMap::<usize, ()>::with_capacity(self.names.len(), 0);
        for node in 0..self.names.len() {
            graph.add_node(node);
        }
        for (from, targets) in self.edges.iter().enumerate() {
            for &to in targets {
                graph.add_edge(from, to, ());
            }
        }

        let mut cycles: Vec<Vec<Name>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| match component.as_slice() {
                [node] => graph.contains_edge(*node, *node),
                _ => true,
            })
            .map(|component| {
                let mut names: Vec<Name> = component
                    .into_iter()
                    .map(|node| self.names[node].clone())
                    .collect();
                names.sort();
                names
            })
            .collect();

        cycles.sort();
        cycles
    }
}
