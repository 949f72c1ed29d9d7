//! The interface graph.
//!
//! Every included interface, and every type that has at least one interface
//! ancestor, becomes a node. A node's ancestors are the interface nodes it is
//! a subtype of (an interface counts as its own ancestor). Nodes are kept in
//! height order, so every ancestor has a lower index than its descendants.
//!
//! Non-interface nodes with identical ancestor sets are indistinguishable for
//! interface checks and are merged before ids are assigned: into an interface
//! with the same ancestors if there is one, otherwise into each other. The
//! merged-away types are recorded on the surviving node and receive its ids.

use hubforge_common::TypeId;
use hubforge_hierarchy::{SubtypeGraph, TypeUniverse};
use indexmap::IndexMap;
use tracing::debug;

/// Index of a node in `InterfaceGraph::nodes`.
pub(crate) type NodeId = u32;

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub ty: TypeId,
    pub is_interface: bool,
    /// Interface node ancestors, sorted; includes the node itself for
    /// interfaces.
    pub sorted_ancestors: Vec<NodeId>,
    /// All descendant nodes including itself, sorted. Empty for
    /// non-interfaces.
    pub sorted_descendants: Vec<NodeId>,
    /// Types merged into this node.
    pub duplicates: Vec<TypeId>,
}

#[derive(Clone, Debug)]
pub(crate) struct InterfaceGraph {
    pub nodes: Vec<Node>,
    /// Interface nodes, children before parents.
    pub interface_nodes: Vec<NodeId>,
}

impl InterfaceGraph {
    pub fn build(universe: &TypeUniverse, graph: &SubtypeGraph) -> Self {
        let mut interface_graph = Self {
            nodes: build_nodes(universe, graph),
            interface_nodes: Vec::new(),
        };
        let before = interface_graph.nodes.len();
        interface_graph.merge_duplicates();
        interface_graph.generate_descendant_index();
        debug!(
            nodes = interface_graph.nodes.len(),
            merged = before - interface_graph.nodes.len(),
            interfaces = interface_graph.interface_nodes.len(),
            "interface graph built"
        );
        interface_graph
    }

    fn merge_duplicates(&mut self) {
        let mut alive: Vec<bool> = vec![true; self.nodes.len()];
        let mut interface_buckets: IndexMap<u64, Vec<NodeId>> = IndexMap::new();
        let mut class_buckets: IndexMap<u64, Vec<Option<NodeId>>> = IndexMap::new();
        let mut single_ancestor = Vec::new();

        for (index, node) in self.nodes.iter().enumerate() {
            let ancestors = &node.sorted_ancestors;
            debug_assert!(!ancestors.is_empty());
            if ancestors.len() == 1 {
                // A class below a single interface is that interface's duplicate.
                if !node.is_interface {
                    alive[index] = false;
                    single_ancestor.push((ancestors[0] as usize, index));
                }
                continue;
            }
            let hash = duplicate_hash(ancestors);
            if node.is_interface {
                interface_buckets
                    .entry(hash)
                    .or_default()
                    .push(index as NodeId);
            } else {
                class_buckets
                    .entry(hash)
                    .or_default()
                    .push(Some(index as NodeId));
            }
        }
        for (keep, duplicate) in single_ancestor {
            self.record_duplicate(keep, duplicate);
        }

        for (hash, interfaces) in &interface_buckets {
            let Some(classes) = class_buckets.get_mut(hash) else {
                continue;
            };
            for &interface in interfaces {
                for slot in classes.iter_mut() {
                    let Some(class) = *slot else {
                        continue;
                    };
                    if self.try_merge(interface, class, &mut alive) {
                        *slot = None;
                    }
                }
            }
        }

        for classes in class_buckets.values_mut() {
            for i in 0..classes.len() {
                let Some(keep) = classes[i] else {
                    continue;
                };
                for j in i + 1..classes.len() {
                    let Some(candidate) = classes[j] else {
                        continue;
                    };
                    if self.try_merge(keep, candidate, &mut alive) {
                        classes[j] = None;
                    }
                }
            }
        }

        // Compact and renumber; ancestors are interfaces, which always survive.
        let mut renumber: Vec<NodeId> = vec![NodeId::MAX; self.nodes.len()];
        let mut next = 0;
        for (index, &keep) in alive.iter().enumerate() {
            if keep {
                renumber[index] = next;
                next += 1;
            }
        }
        let nodes = std::mem::take(&mut self.nodes);
        self.nodes = nodes
            .into_iter()
            .zip(alive)
            .filter(|(_, keep)| *keep)
            .map(|(mut node, _)| {
                for ancestor in &mut node.sorted_ancestors {
                    *ancestor = renumber[*ancestor as usize];
                }
                node
            })
            .collect();
    }

    fn try_merge(&mut self, keep: NodeId, candidate: NodeId, alive: &mut [bool]) -> bool {
        let (keep, candidate) = (keep as usize, candidate as usize);
        if self.nodes[keep].sorted_ancestors != self.nodes[candidate].sorted_ancestors {
            return false;
        }
        debug_assert!(!self.nodes[candidate].is_interface);
        alive[candidate] = false;
        self.record_duplicate(keep, candidate);
        true
    }

    fn record_duplicate(&mut self, keep: usize, duplicate: usize) {
        debug_assert!(self.nodes[duplicate].duplicates.is_empty());
        let ty = self.nodes[duplicate].ty;
        self.nodes[keep].duplicates.push(ty);
    }

    fn generate_descendant_index(&mut self) {
        let mut descendants: Vec<Vec<NodeId>> = vec![Vec::new(); self.nodes.len()];
        let mut interface_nodes = Vec::new();
        for index in (0..self.nodes.len()).rev() {
            if self.nodes[index].is_interface {
                let mut collected = std::mem::take(&mut descendants[index]);
                collected.push(index as NodeId);
                collected.sort_unstable();
                collected.dedup();
                self.nodes[index].sorted_descendants = collected;
                interface_nodes.push(index as NodeId);
            }
            for &ancestor in &self.nodes[index].sorted_ancestors {
                if ancestor as usize != index {
                    descendants[ancestor as usize].push(index as NodeId);
                }
            }
        }
        for node in &mut self.nodes {
            node.duplicates.sort_unstable();
        }
        self.interface_nodes = interface_nodes;
    }
}

/// Nodes in height order with their interface ancestors propagated down.
fn build_nodes(universe: &TypeUniverse, graph: &SubtypeGraph) -> Vec<Node> {
    let mut inherited: Vec<Option<Vec<NodeId>>> = vec![None; universe.len()];
    let mut nodes = Vec::new();
    for &ty in graph.height_order() {
        let is_interface = universe.is_type_check_interface(ty);
        let mut ancestors = match inherited[ty.index()].take() {
            Some(ancestors) => ancestors,
            None if is_interface => Vec::new(),
            None => continue,
        };
        let id = nodes.len() as NodeId;
        if is_interface {
            ancestors.push(id);
        }
        ancestors.sort_unstable();
        ancestors.dedup();
        for &child in graph.subtypes(ty) {
            inherited[child.index()]
                .get_or_insert_with(Vec::new)
                .extend_from_slice(&ancestors);
        }
        nodes.push(Node {
            ty,
            is_interface,
            sorted_ancestors: ancestors,
            sorted_descendants: Vec::new(),
            duplicates: Vec::new(),
        });
    }
    nodes
}

fn duplicate_hash(ancestors: &[NodeId]) -> u64 {
    let squares = ancestors
        .iter()
        .fold(0u64, |acc, &id| acc.wrapping_add(u64::from(id) * u64::from(id)));
    ((ancestors.len() as u64) << 32).wrapping_add(squares)
}

#[cfg(test)]
#[path = "../../tests/interface_graph_tests.rs"]
mod tests;
