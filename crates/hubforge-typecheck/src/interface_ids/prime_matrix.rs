//! Prime matrices and the consecutive-ones test.
//!
//! Each interface contributes one *contiguous group*: the set of interface
//! graph nodes that must receive contiguous ids. Groups that strictly overlap
//! (they intersect but neither contains the other) constrain each other's
//! order; the connected components of that relation are *prime matrices* and
//! can be ordered independently.
//!
//! A matrix keeps an ordered partition of its nodes (`ordering`). Nodes in one
//! set may share an id; every group added so far covers a run of consecutive
//! sets. New groups are added with the column-partition step of Hsu, "A Simple
//! Test for the Consecutive Ones Property", which requires every added group
//! (after the first) to overlap what is already ordered.

use fixedbitset::FixedBitSet;

/// How much of an ordering set a new group covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SetColor {
    Empty,
    Partial,
    Full,
}

impl SetColor {
    fn of(set: &FixedBitSet, colored: &FixedBitSet) -> Self {
        if set.is_disjoint(colored) {
            SetColor::Empty
        } else if set.is_subset(colored) {
            SetColor::Full
        } else {
            SetColor::Partial
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct PrimeMatrix {
    /// Indices of the contained groups in the owning slot.
    pub groups: Vec<usize>,
    pub ordering: Vec<FixedBitSet>,
    pub contained: FixedBitSet,
    /// Cleared once the matrix has been merged into a larger one.
    pub live: bool,
}

impl PrimeMatrix {
    pub fn empty(num_nodes: usize) -> Self {
        Self {
            groups: Vec::new(),
            ordering: Vec::new(),
            contained: FixedBitSet::with_capacity(num_nodes),
            live: true,
        }
    }

    /// A matrix starting from `source`'s ordering, with no groups yet.
    pub fn with_ordering_of(source: &PrimeMatrix) -> Self {
        Self {
            groups: Vec::new(),
            ordering: source.ordering.clone(),
            contained: source.contained.clone(),
            live: true,
        }
    }

    /// Try to add `group` to the ordering. On `false` the matrix is left in
    /// an unspecified state and must be discarded.
    pub fn add_group_and_check_c1p(&mut self, group: &FixedBitSet) -> bool {
        let mut uncovered = group.clone();
        uncovered.difference_with(&self.contained);

        let num_sets = self.ordering.len();
        match num_sets {
            0 => self.ordering.push(uncovered.clone()),
            1 => {
                // A - B, A & B, B - A.
                self.ordering[0].difference_with(group);
                let mut shared = group.clone();
                shared.intersect_with(&self.contained);
                self.ordering.push(shared);
                self.ordering.push(uncovered.clone());
            }
            _ => {
                let colors: Vec<SetColor> = self
                    .ordering
                    .iter()
                    .map(|set| SetColor::of(set, group))
                    .collect();
                let mut touched = colors
                    .iter()
                    .enumerate()
                    .filter(|(_, color)| **color != SetColor::Empty)
                    .map(|(index, _)| index);
                let Some(left) = touched.next() else {
                    return false;
                };
                let right = touched.last().unwrap_or(left);

                if (left + 1..right).any(|index| colors[index] != SetColor::Full) {
                    return false;
                }

                let left_color = colors[left];
                let right_color = colors[right];
                if uncovered.count_ones(..) == 0 {
                    self.split_colored(right_color, group, right, right);
                    if left != right {
                        self.split_colored(left_color, group, left, left + 1);
                    }
                } else if left == 0 && left_color == SetColor::Full {
                    self.split_colored(right_color, group, right, right);
                    self.ordering.insert(0, uncovered.clone());
                } else if right == num_sets - 1 && right_color == SetColor::Full {
                    self.split_colored(left_color, group, left, left + 1);
                    self.ordering.push(uncovered.clone());
                } else {
                    return false;
                }
            }
        }

        self.contained.union_with(&uncovered);
        true
    }

    /// Move the colored part of a partially colored set into its own set at
    /// `dst`.
    fn split_colored(&mut self, color: SetColor, colored: &FixedBitSet, src: usize, dst: usize) {
        debug_assert!(color != SetColor::Empty);
        if color != SetColor::Partial {
            return;
        }
        let mut part = self.ordering[src].clone();
        part.intersect_with(colored);
        self.ordering[src].difference_with(&part);
        self.ordering.insert(dst, part);
    }
}

pub(crate) fn to_bitset(ids: &[u32], num_nodes: usize) -> FixedBitSet {
    let mut set = FixedBitSet::with_capacity(num_nodes);
    for &id in ids {
        set.insert(id as usize);
    }
    set
}

#[cfg(test)]
#[path = "../../tests/prime_matrix_tests.rs"]
mod tests;
