//! Property dependency graph: cycle detection and evaluation order.

use std::collections::{BTreeMap, BTreeSet};

use hashbrown::HashMap;

use super::conflict::Winner;
use crate::specifier::Specifier;
use crate::{Error, Result};

/// Edges `P -> Q` meaning "the value chosen for P reads Q".
#[derive(Debug, Default)]
pub(crate) struct DependencyGraph {
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Build the graph from the winning specifiers.
    ///
    /// Every dependency must itself be supplied by some specifier.
    pub fn build(specs: &[Specifier], winners: &BTreeMap<String, Winner>) -> Result<Self> {
        let mut edges = BTreeMap::new();
        for (prop, winner) in winners {
            let mut deps: BTreeSet<String> = specs[winner.base].required_properties().clone();
            if let Some(m) = winner.modifier {
                deps.extend(specs[m].required_properties().iter().cloned());
            }
            if let Some(missing) = deps.iter().find(|d| !winners.contains_key(*d)) {
                return Err(Error::MissingDependency {
                    property: prop.clone(),
                    dependency: missing.clone(),
                });
            }
            edges.insert(prop.clone(), deps);
        }
        Ok(Self { edges })
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Fail with the first cycle found, as a closed path `[a, b, a]`.
    ///
    /// Depth-first from each property in name order, so the reported cycle
    /// is stable across runs.
    pub fn check_acyclic(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark { Visiting, Done }

        let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(self.edges.len());
        let mut stack: Vec<&str> = Vec::new();

        for root in self.edges.keys() {
            if marks.contains_key(root.as_str()) {
                continue;
            }
            // Explicit stack of (node, remaining neighbours).
            let mut frames: Vec<(&str, std::collections::btree_set::Iter<'_, String>)> =
                vec![(root.as_str(), self.edges[root].iter())];
            marks.insert(root.as_str(), Mark::Visiting);
            stack.push(root.as_str());

            while let Some((node, neighbours)) = frames.last_mut() {
                match neighbours.next() {
                    Some(next) => match marks.get(next.as_str()) {
                        Some(Mark::Done) => {}
                        Some(Mark::Visiting) => {
                            let start = stack.iter().position(|n| *n == next.as_str()).unwrap_or(0);
                            let mut cycle: Vec<String> =
                                stack[start..].iter().map(|n| (*n).to_owned()).collect();
                            cycle.push(next.clone());
                            return Err(Error::CircularDependency { cycle });
                        }
                        None => {
                            marks.insert(next.as_str(), Mark::Visiting);
                            stack.push(next.as_str());
                            let deps = self.edges.get(next).map(|d| d.iter()).unwrap_or_default();
                            frames.push((next.as_str(), deps));
                        }
                    },
                    None => {
                        marks.insert(*node, Mark::Done);
                        stack.pop();
                        frames.pop();
                    }
                }
            }
        }
        Ok(())
    }

    /// Kahn's algorithm; among ready properties the smallest name goes first.
    ///
    /// A stall with properties left over is reported as a cycle over the
    /// remaining properties.
    pub fn evaluation_order(&self) -> Result<Vec<String>> {
        let mut in_degree: HashMap<&str, usize> = HashMap::with_capacity(self.edges.len());
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
        for (prop, deps) in &self.edges {
            in_degree.insert(prop.as_str(), deps.len());
            for dep in deps {
                dependents.entry(dep.as_str()).or_default().push(prop.as_str());
            }
        }

        let mut ready: BTreeSet<&str> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(p, _)| *p)
            .collect();
        let mut order = Vec::with_capacity(self.edges.len());

        while let Some(prop) = ready.pop_first() {
            order.push(prop.to_owned());
            for dependent in dependents.get(prop).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        if order.len() != self.edges.len() {
            let mut cycle: Vec<String> = in_degree
                .iter()
                .filter(|(_, d)| **d > 0)
                .map(|(p, _)| (*p).to_owned())
                .collect();
            cycle.sort();
            return Err(Error::CircularDependency { cycle });
        }
        Ok(order)
    }
}
