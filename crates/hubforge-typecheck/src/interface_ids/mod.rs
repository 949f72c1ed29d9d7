//! Interface id assignment.
//!
//! A type may implement any number of unrelated interfaces, so interface
//! checks cannot use a single pre-order numbering. Instead every interface
//! asks for its descendant set to be numbered contiguously in *some* slot,
//! and as many such requirements as possible are packed into each slot:
//!
//! 1. [`graph`] builds the interface graph, merges indistinguishable class
//!    nodes and computes every interface's descendant set.
//! 2. [`slot`] places each descendant set in the first slot where the
//!    consecutive-ones property still holds and the ids fit, opening new
//!    slots as needed.
//! 3. Each slot's final ordering is turned into ids, and every interface's
//!    check is the min/max id over its descendants.

pub(crate) mod graph;
pub(crate) mod prime_matrix;
pub(crate) mod slot;

use crate::class_ids::{SlotIds, slot_number};
use crate::range::RangeCheck;
use graph::InterfaceGraph;
use hubforge_common::limits::UNASSIGNED_ID;
use hubforge_common::{LayoutError, LayoutResult};
use hubforge_hierarchy::{SubtypeGraph, TypeUniverse};
use slot::{AddGroupingResult, InterfaceSlot};
use smallvec::smallvec;
use tracing::debug;

/// Output of the interface id pass.
#[derive(Clone, Debug)]
pub struct InterfaceIdAssignment {
    pub num_slots: usize,
    /// Interface slot ids per type, `num_slots` long for every included type;
    /// 0 where the type does not take part in a slot.
    pub slot_ids: Vec<SlotIds>,
    /// Range check of every included interface, with the slot number already
    /// offset past the class slots.
    pub checks: Vec<Option<RangeCheck>>,
}

pub struct InterfaceIdBuilder<'a> {
    universe: &'a TypeUniverse,
    graph: &'a SubtypeGraph,
    capacity: u32,
    first_slot: usize,
}

impl<'a> InterfaceIdBuilder<'a> {
    /// `first_slot` is the global number of the first interface slot, i.e.
    /// the number of class slots.
    pub fn new(
        universe: &'a TypeUniverse,
        graph: &'a SubtypeGraph,
        capacity: u32,
        first_slot: usize,
    ) -> Self {
        Self {
            universe,
            graph,
            capacity,
            first_slot,
        }
    }

    pub fn build(self) -> LayoutResult<InterfaceIdAssignment> {
        let interface_graph = InterfaceGraph::build(self.universe, self.graph);
        let num_nodes = interface_graph.nodes.len();

        let mut slots: Vec<InterfaceSlot> = Vec::new();
        let mut node_slot = vec![usize::MAX; num_nodes];
        for &node in &interface_graph.interface_nodes {
            let descendants = &interface_graph.nodes[node as usize].sorted_descendants;
            let mut placed = None;
            let mut resort = false;
            for slot in &mut slots {
                match slot.try_add_grouping(descendants) {
                    AddGroupingResult::Success => {
                        placed = Some(slot.id);
                        break;
                    }
                    AddGroupingResult::CapacityOverflow => resort = true,
                    AddGroupingResult::InvalidC1p => {}
                }
            }
            let slot_id = match placed {
                Some(id) => id,
                None => {
                    let mut fresh = InterfaceSlot::new(slots.len(), self.capacity, num_nodes);
                    if fresh.try_add_grouping(descendants) != AddGroupingResult::Success {
                        return Err(LayoutError::structural(format!(
                            "interface {} does not fit in an empty slot",
                            self.universe.name(interface_graph.nodes[node as usize].ty)
                        )));
                    }
                    let id = fresh.id;
                    slots.push(fresh);
                    id
                }
            };
            node_slot[node as usize] = slot_id;
            if resort {
                // Emptiest slots first.
                slots.sort_by_key(|slot| slot.num_reserved_ids);
            }
        }

        let num_slots = slots.len();
        let mut node_ids: Vec<SlotIds> = vec![smallvec![UNASSIGNED_ID; num_slots]; num_nodes];
        for slot in &slots {
            let ordering = slot.c1p_order();
            if ordering.len() as u64 >= u64::from(self.capacity) {
                return Err(LayoutError::structural(format!(
                    "interface slot {} needs {} ids, capacity is {}",
                    slot.id,
                    ordering.len() + 1,
                    self.capacity
                )));
            }
            for (index, set) in ordering.iter().enumerate() {
                let id = (index + 1) as u16;
                for node in set.ones() {
                    node_ids[node][slot.id] = id;
                }
            }
        }

        let mut checks = vec![None; self.universe.len()];
        for &node in &interface_graph.interface_nodes {
            let local_slot = node_slot[node as usize];
            let ids = interface_graph.nodes[node as usize]
                .sorted_descendants
                .iter()
                .map(|&descendant| node_ids[descendant as usize][local_slot]);
            let (min, max) = ids.fold((u16::MAX, 0u16), |(lo, hi), id| (lo.min(id), hi.max(id)));
            if min == 0 || min > max {
                return Err(LayoutError::structural(format!(
                    "interface {} has descendants without an id in its slot",
                    self.universe.name(interface_graph.nodes[node as usize].ty)
                )));
            }
            checks[interface_graph.nodes[node as usize].ty.index()] = Some(RangeCheck {
                slot: slot_number(self.first_slot + local_slot)?,
                start: min,
                range: max - min + 1,
            });
        }

        let mut slot_ids = vec![SlotIds::new(); self.universe.len()];
        for &ty in self.graph.height_order() {
            slot_ids[ty.index()] = smallvec![UNASSIGNED_ID; num_slots];
        }
        for (node, ids) in interface_graph.nodes.iter().zip(node_ids) {
            for &duplicate in &node.duplicates {
                slot_ids[duplicate.index()] = ids.clone();
            }
            slot_ids[node.ty.index()] = ids;
        }

        debug!(
            num_slots,
            interfaces = interface_graph.interface_nodes.len(),
            "interface ids assigned"
        );
        Ok(InterfaceIdAssignment {
            num_slots,
            slot_ids,
            checks,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/interface_ids_tests.rs"]
mod tests;
