//! The type-check subtype graph.
//!
//! The id assigners do not work on the declared hierarchy directly. They need
//! a DAG over the *included* (reachable) types whose edges, followed
//! transitively, give exactly the subtype relation, including array
//! covariance and with unreachable intermediate types bypassed. This module
//! builds that DAG.
//!
//! ## Construction
//!
//! Element types (everything that is not an array) are linked to their
//! declared supertypes; interfaces without superinterfaces hang below the root
//! class. For each array dimension `d`, the element graph is walked children
//! first and every element type either claims its subtree (when its
//! `d`-dimensional array is included) or forwards the collected subtypes to
//! its own parents. The claimed sets become the edges of dimension `d`.
//!
//! For `d > 0`, arrays that end up without a parent are hung below the
//! highest included lower-dimensional array of the root class and of each
//! array interface (`Object[][]` under `Object[]`, `int[]` under `Object`).
//! Class-like arrays that are only reachable through interface arrays are
//! treated the same way, so every class-like type keeps a class parent.
//!
//! ## Derived views
//!
//! - **Height order**: included types sorted by longest distance from a root,
//!   ties by `TypeId`. Every type comes after all of its supertypes; its index
//!   is the type's ordinal.
//! - **Class tree**: every non-interface type's deepest non-interface parent.
//!   Other edges between class-like types are transitive duplicates.

use crate::universe::TypeUniverse;
use fixedbitset::FixedBitSet;
use hubforge_common::{LayoutError, LayoutResult, TypeId};
use smallvec::SmallVec;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct SubtypeGraph {
    included: FixedBitSet,
    subtypes: Vec<Vec<TypeId>>,
    parents: Vec<Vec<TypeId>>,
    class_parent: Vec<Option<TypeId>>,
    class_children: Vec<Vec<TypeId>>,
    roots: Vec<TypeId>,
    height_order: Vec<TypeId>,
    ordinals: Vec<Option<u32>>,
}

impl SubtypeGraph {
    pub fn build(universe: &TypeUniverse) -> LayoutResult<Self> {
        let num_types = universe.len();
        let root = universe.root();

        let mut included = FixedBitSet::with_capacity(num_types);
        for ty in universe.type_ids() {
            if universe.ty(ty).is_reachable() {
                included.insert(ty.index());
            }
        }
        if !included.contains(root.index()) {
            return Err(LayoutError::structural(format!(
                "root class {} is not reachable",
                universe.name(root)
            )));
        }

        let subtypes = build_subtype_edges(universe, &included);

        let mut parents = vec![Vec::new(); num_types];
        for (index, children) in subtypes.iter().enumerate() {
            for &child in children {
                parents[child.index()].push(TypeId::from_index(index));
            }
        }

        let included_types: Vec<TypeId> = included.ones().map(TypeId::from_index).collect();
        let (height_order, heights) = height_order(&included_types, &subtypes);
        if height_order.len() != included_types.len() {
            return Err(LayoutError::structural(
                "subtype graph contains a cycle".to_string(),
            ));
        }

        let mut roots = Vec::new();
        let mut class_parent = vec![None; num_types];
        let mut class_children = vec![Vec::new(); num_types];
        for &ty in &included_types {
            let ty_parents = &parents[ty.index()];
            if ty_parents.is_empty() {
                if ty != root && !universe.ty(ty).is_primitive() {
                    return Err(LayoutError::structural(format!(
                        "{} is not below the root class",
                        universe.name(ty)
                    )));
                }
                roots.push(ty);
                continue;
            }
            if universe.is_type_check_interface(ty) {
                continue;
            }
            let deepest = ty_parents
                .iter()
                .copied()
                .filter(|&parent| !universe.is_type_check_interface(parent))
                .max_by_key(|&parent| (heights[parent.index()], parent));
            let Some(parent) = deepest else {
                return Err(LayoutError::structural(format!(
                    "{} has no class-like supertype in the subtype graph",
                    universe.name(ty)
                )));
            };
            class_parent[ty.index()] = Some(parent);
            class_children[parent.index()].push(ty);
        }

        let mut ordinals = vec![None; num_types];
        for (ordinal, &ty) in height_order.iter().enumerate() {
            ordinals[ty.index()] = Some(ordinal as u32);
        }

        debug!(
            included = included_types.len(),
            roots = roots.len(),
            "subtype graph built"
        );

        Ok(Self {
            included,
            subtypes,
            parents,
            class_parent,
            class_children,
            roots,
            height_order,
            ordinals,
        })
    }

    pub fn is_included(&self, ty: TypeId) -> bool {
        self.included.contains(ty.index())
    }

    pub fn num_included(&self) -> usize {
        self.height_order.len()
    }

    /// Direct subtypes in the graph, sorted. Empty for excluded types.
    pub fn subtypes(&self, ty: TypeId) -> &[TypeId] {
        &self.subtypes[ty.index()]
    }

    pub fn parents(&self, ty: TypeId) -> &[TypeId] {
        &self.parents[ty.index()]
    }

    pub fn class_parent(&self, ty: TypeId) -> Option<TypeId> {
        self.class_parent[ty.index()]
    }

    /// Children in the class tree, sorted.
    pub fn class_children(&self, ty: TypeId) -> &[TypeId] {
        &self.class_children[ty.index()]
    }

    /// The root class followed by the included primitives.
    pub fn roots(&self) -> &[TypeId] {
        &self.roots
    }

    pub fn height_order(&self) -> &[TypeId] {
        &self.height_order
    }

    /// Position of `ty` in the height order.
    pub fn ordinal(&self, ty: TypeId) -> Option<u32> {
        self.ordinals[ty.index()]
    }

    /// The highest-dimensional included array of the root class with at most
    /// `dim` dimensions (the root class itself for 0).
    pub fn root_array_up_to(&self, universe: &TypeUniverse, dim: u32) -> TypeId {
        (0..=dim)
            .rev()
            .find_map(|d| {
                universe
                    .array_of(universe.root(), d)
                    .filter(|&array| self.is_included(array))
            })
            .unwrap_or(universe.root())
    }
}

/// Edges of the type-check subtype graph, indexed by parent.
fn build_subtype_edges(universe: &TypeUniverse, included: &FixedBitSet) -> Vec<Vec<TypeId>> {
    let num_types = universe.len();
    let root = universe.root();

    let mut element_types = Vec::new();
    let mut element_parents: Vec<Vec<TypeId>> = vec![Vec::new(); num_types];
    let mut max_dim = 0;
    for ty in universe.type_ids() {
        let info = universe.ty(ty);
        if info.is_array() {
            max_dim = max_dim.max(universe.dimension(ty));
            continue;
        }
        element_types.push(ty);
        let ty_parents = &mut element_parents[ty.index()];
        ty_parents.extend(info.superclass);
        ty_parents.extend(info.interfaces.iter().copied());
        if info.is_interface() && info.interfaces.is_empty() {
            ty_parents.push(root);
        }
    }
    // Child-to-parent edges: sources are the leaves, so this is children first.
    let (children_first, _) = height_order(&element_types, &element_parents);

    let present = |element: TypeId, dim: u32| {
        universe
            .array_of(element, dim)
            .filter(|array| included.contains(array.index()))
    };

    let mut subtypes: Vec<Vec<TypeId>> = vec![Vec::new(); num_types];
    for dim in 0..=max_dim {
        let mut pending: Vec<Vec<TypeId>> = vec![Vec::new(); num_types];
        let mut claimed: Vec<(TypeId, Vec<TypeId>)> = Vec::new();
        for &ty in &children_first {
            let mut collected = std::mem::take(&mut pending[ty.index()]);
            collected.sort_unstable();
            collected.dedup();
            let forwarded = match present(ty, dim) {
                Some(array) => {
                    claimed.push((array, collected));
                    vec![array]
                }
                None => collected,
            };
            for &parent in &element_parents[ty.index()] {
                pending[parent.index()].extend_from_slice(&forwarded);
            }
        }
        if claimed.is_empty() {
            continue;
        }

        if dim > 0 {
            let mut has_parent = FixedBitSet::with_capacity(num_types);
            let mut has_class_parent = FixedBitSet::with_capacity(num_types);
            for (array, children) in &claimed {
                let class_like = !universe.is_type_check_interface(*array);
                for child in children {
                    has_parent.insert(child.index());
                    if class_like {
                        has_class_parent.insert(child.index());
                    }
                }
            }

            let lower = |element: TypeId| (0..dim).rev().find_map(|d| present(element, d));
            let mut fallback_parents: SmallVec<[TypeId; 4]> = SmallVec::new();
            fallback_parents.extend(lower(root));
            for &iface in universe.array_interfaces() {
                fallback_parents.extend(lower(iface));
            }

            for (array, _) in &claimed {
                let detached = !has_parent.contains(array.index())
                    || (!universe.is_type_check_interface(*array)
                        && !has_class_parent.contains(array.index()));
                if detached {
                    for &parent in &fallback_parents {
                        subtypes[parent.index()].push(*array);
                    }
                }
            }
        }

        for (array, children) in claimed {
            subtypes[array.index()].extend(children);
        }
    }

    for list in &mut subtypes {
        list.sort_unstable();
        list.dedup();
    }
    subtypes
}

/// Longest-path layering of `nodes` along `edges` (indexed by source), with
/// ties broken by `TypeId`. Edges to nodes outside `nodes` are ignored.
///
/// Returns the order and each node's height (indexed by `TypeId`). Nodes on a
/// cycle are left out of the order.
pub(crate) fn height_order(nodes: &[TypeId], edges: &[Vec<TypeId>]) -> (Vec<TypeId>, Vec<u32>) {
    let num_types = edges.len();
    let mut member = FixedBitSet::with_capacity(num_types);
    for &node in nodes {
        member.insert(node.index());
    }

    let mut in_degree = vec![0u32; num_types];
    for &node in nodes {
        for &target in &edges[node.index()] {
            if member.contains(target.index()) {
                in_degree[target.index()] += 1;
            }
        }
    }

    let mut heights = vec![0u32; num_types];
    let mut ready: Vec<TypeId> = nodes
        .iter()
        .copied()
        .filter(|node| in_degree[node.index()] == 0)
        .collect();
    let mut visited = Vec::with_capacity(nodes.len());
    while let Some(node) = ready.pop() {
        visited.push(node);
        let height = heights[node.index()];
        for &target in &edges[node.index()] {
            if !member.contains(target.index()) {
                continue;
            }
            heights[target.index()] = heights[target.index()].max(height + 1);
            in_degree[target.index()] -= 1;
            if in_degree[target.index()] == 0 {
                ready.push(target);
            }
        }
    }

    visited.sort_by_key(|&node| (heights[node.index()], node));
    (visited, heights)
}

#[cfg(test)]
#[path = "../tests/subtype_graph_tests.rs"]
mod tests;
