//! One interface slot: the groups placed in it and their prime matrices.

use super::graph::NodeId;
use super::prime_matrix::{PrimeMatrix, to_bitset};
use fixedbitset::FixedBitSet;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Reverse;
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AddGroupingResult {
    CapacityOverflow,
    InvalidC1p,
    Success,
}

/// The contiguity requirement of one interface.
#[derive(Clone, Debug)]
struct ContiguousGroup {
    ids: Vec<NodeId>,
    matrix: usize,
    /// Last `try_add_grouping` call that compared against this group.
    last_timestamp: u32,
    /// Strictly overlapping groups of the same matrix.
    neighbors: Vec<usize>,
}

#[derive(Clone, Debug)]
pub(crate) struct InterfaceSlot {
    pub id: usize,
    /// Ids needed to satisfy every group placed here, plus id 0.
    pub num_reserved_ids: u32,
    capacity: u32,
    num_nodes: usize,
    current_timestamp: u32,
    groups: Vec<ContiguousGroup>,
    matrices: Vec<PrimeMatrix>,
    column_to_groups: FxHashMap<NodeId, Vec<usize>>,
}

impl InterfaceSlot {
    pub fn new(id: usize, capacity: u32, num_nodes: usize) -> Self {
        Self {
            id,
            num_reserved_ids: 1,
            capacity,
            num_nodes,
            current_timestamp: 0,
            groups: Vec::new(),
            matrices: Vec::new(),
            column_to_groups: FxHashMap::default(),
        }
    }

    /// Place the contiguity requirement `descendants` (sorted node ids) in
    /// this slot. Anything but `Success` leaves the slot unchanged.
    pub fn try_add_grouping(&mut self, descendants: &[NodeId]) -> AddGroupingResult {
        self.current_timestamp += 1;
        let timestamp = self.current_timestamp;

        let mut edges = Vec::new();
        let mut linked = Vec::new();
        let mut seen_matrices = FxHashSet::default();
        for column in descendants {
            let Some(group_indices) = self.column_to_groups.get(column) else {
                continue;
            };
            for &index in group_indices {
                let group = &mut self.groups[index];
                if group.last_timestamp == timestamp {
                    continue;
                }
                group.last_timestamp = timestamp;
                if strictly_overlaps(descendants, &group.ids) {
                    edges.push(index);
                    if seen_matrices.insert(group.matrix) {
                        linked.push(group.matrix);
                    }
                }
            }
        }

        let new_index = self.groups.len();
        let new_bits = to_bitset(descendants, self.num_nodes);
        let Some(candidate) = self.incorporate(new_index, &new_bits, &linked, &edges) else {
            return AddGroupingResult::InvalidC1p;
        };

        let linked_sets: usize = linked
            .iter()
            .map(|&matrix| self.matrices[matrix].ordering.len())
            .sum();
        debug_assert!(candidate.ordering.len() >= linked_sets);
        let delta = candidate.ordering.len().saturating_sub(linked_sets) as u32;
        let reserved = self.num_reserved_ids + delta;
        if reserved > self.capacity {
            return AddGroupingResult::CapacityOverflow;
        }

        self.num_reserved_ids = reserved;
        let matrix_index = self.matrices.len();
        for &matrix in &linked {
            let retired = &mut self.matrices[matrix];
            retired.live = false;
            for group in std::mem::take(&mut retired.groups) {
                self.groups[group].matrix = matrix_index;
            }
        }
        for &edge in &edges {
            self.groups[edge].neighbors.push(new_index);
        }
        self.groups.push(ContiguousGroup {
            ids: descendants.to_vec(),
            matrix: matrix_index,
            last_timestamp: timestamp,
            neighbors: edges,
        });
        self.matrices.push(candidate);
        for &column in descendants {
            self.column_to_groups
                .entry(column)
                .or_default()
                .push(new_index);
        }
        trace!(
            slot = self.id,
            reserved = self.num_reserved_ids,
            merged = linked.len(),
            "interface group placed"
        );
        AddGroupingResult::Success
    }

    /// Combined matrix of the new group and every matrix it links, or `None`
    /// if no consecutive-ones ordering exists.
    ///
    /// The largest linked matrix is already known to satisfy the property, so
    /// its ordering is the starting point; the new group and the spanning
    /// trees of the other linked matrices are then added one by one.
    fn incorporate(
        &self,
        new_index: usize,
        new_bits: &FixedBitSet,
        linked: &[usize],
        edges: &[usize],
    ) -> Option<PrimeMatrix> {
        let mut largest: Option<usize> = None;
        for &matrix in linked {
            let size = self.matrices[matrix].groups.len();
            if largest.is_none_or(|best| size > self.matrices[best].groups.len()) {
                largest = Some(matrix);
            }
        }

        let mut combined = match largest {
            Some(matrix) => PrimeMatrix::with_ordering_of(&self.matrices[matrix]),
            None => PrimeMatrix::empty(self.num_nodes),
        };
        if !combined.add_group_and_check_c1p(new_bits) {
            return None;
        }

        let mut covered: FxHashSet<usize> = largest.into_iter().collect();
        for &edge in edges {
            if !covered.insert(self.groups[edge].matrix) {
                continue;
            }
            for group in self.spanning_tree(edge) {
                let bits = to_bitset(&self.groups[group].ids, self.num_nodes);
                if !combined.add_group_and_check_c1p(&bits) {
                    return None;
                }
            }
        }

        combined.groups = std::iter::once(new_index)
            .chain(
                linked
                    .iter()
                    .flat_map(|&matrix| self.matrices[matrix].groups.iter().copied()),
            )
            .collect();
        Some(combined)
    }

    /// Depth-first pre-order over the matrix containing `start`; every group
    /// after the first overlaps one listed before it.
    fn spanning_tree(&self, start: usize) -> Vec<usize> {
        let mut seen = FxHashSet::default();
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(group) = stack.pop() {
            if !seen.insert(group) {
                continue;
            }
            order.push(group);
            for &neighbor in self.groups[group].neighbors.iter().rev() {
                if !seen.contains(&neighbor) {
                    stack.push(neighbor);
                }
            }
        }
        order
    }

    /// Final ordering of every node in this slot. Nodes in one set share an
    /// id; set `i` gets id `i + 1`.
    ///
    /// Live matrices are either disjoint or one's nodes all lie in a single
    /// set of a larger one, so taking them largest first either appends an
    /// ordering or splices it into the set that contains it.
    pub fn c1p_order(&self) -> Vec<FixedBitSet> {
        let mut live: Vec<&PrimeMatrix> = self.matrices.iter().filter(|m| m.live).collect();
        // Coarser first among matrices spanning the same nodes.
        live.sort_by_key(|matrix| (Reverse(matrix.contained.count_ones(..)), matrix.ordering.len()));

        let mut ordering: Vec<FixedBitSet> = Vec::new();
        let mut covered = FixedBitSet::with_capacity(self.num_nodes);
        for matrix in live {
            let Some(representative) = matrix.contained.ones().next() else {
                continue;
            };
            if !covered.contains(representative) {
                debug_assert!(covered.is_disjoint(&matrix.contained));
                ordering.extend(matrix.ordering.iter().cloned());
                covered.union_with(&matrix.contained);
                continue;
            }
            let Some(index) = ordering
                .iter()
                .position(|set| set.contains(representative))
            else {
                continue;
            };
            debug_assert!(matrix.contained.is_subset(&ordering[index]));
            ordering[index].difference_with(&matrix.contained);
            ordering.splice(index + 1..index + 1, matrix.ordering.iter().cloned());
            if ordering[index].count_ones(..) == 0 {
                ordering.remove(index);
            }
        }
        ordering
    }
}

/// Both sorted groups share a node and neither contains the other.
fn strictly_overlaps(a: &[NodeId], b: &[NodeId]) -> bool {
    let (mut i, mut j, mut matches) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Equal => {
                matches += 1;
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }
    matches != 0 && matches != a.len().min(b.len())
}

#[cfg(test)]
#[path = "../../tests/interface_slot_tests.rs"]
mod tests;
