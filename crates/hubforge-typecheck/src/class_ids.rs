//! Class id assignment.
//!
//! Non-interface types form a tree (the class tree of the subtype graph), so a
//! pre-order numbering makes every class's subtree a contiguous id range
//! (Schubert et al., "Determining type, part, color and time relationships").
//!
//! Ids are 16-bit, so a tree with more types than one slot can hold is spread
//! over several class slots. When a type's subtree would not fit in the rest
//! of the current slot, the type *reserves* an id counted down from the slot's
//! capacity and takes everything up to it as its range. Its descendants keep
//! numbering until the slot is full and then continue in a fresh slot; each
//! type's slot vector is a snapshot of the current id of every open slot, so
//! descendants numbered in a later slot still carry an id inside the reserving
//! ancestor's range in the earlier one. Once the reserving type is done, the
//! reservation is released so later siblings land outside its range.

use crate::range::RangeCheck;
use hubforge_common::limits::{STACK_GROW_SIZE, STACK_RED_ZONE, UNASSIGNED_ID};
use hubforge_common::{LayoutError, LayoutResult, TypeId};
use hubforge_hierarchy::{SubtypeGraph, TypeUniverse};
use smallvec::SmallVec;
use tracing::{debug, trace};

pub type SlotIds = SmallVec<[u16; 8]>;

/// Output of the class id pass.
#[derive(Clone, Debug)]
pub struct ClassIdAssignment {
    pub num_slots: usize,
    /// Class slot ids per type, `num_slots` long for every included type.
    pub slot_ids: Vec<SlotIds>,
    /// Range check of every included non-interface type.
    pub checks: Vec<Option<RangeCheck>>,
}

/// Where the pre-order walk stands for one type.
#[derive(Clone, Copy, Debug)]
struct TypeState {
    slot: usize,
    assigned: u32,
    max_subtype: u32,
    /// Reserved id counted from the top of the slot; 0 if none.
    reserved: u32,
}

pub struct ClassIdBuilder<'a> {
    universe: &'a TypeUniverse,
    graph: &'a SubtypeGraph,
    capacity: u32,
    num_descendants: Vec<u32>,
    current_ids: Vec<u32>,
    num_reserved: Vec<u32>,
    slot_ids: Vec<SlotIds>,
    checks: Vec<Option<RangeCheck>>,
}

impl<'a> ClassIdBuilder<'a> {
    pub fn new(universe: &'a TypeUniverse, graph: &'a SubtypeGraph, capacity: u32) -> Self {
        Self {
            universe,
            graph,
            capacity,
            num_descendants: vec![0; universe.len()],
            current_ids: Vec::new(),
            num_reserved: Vec::new(),
            slot_ids: vec![SlotIds::new(); universe.len()],
            checks: vec![None; universe.len()],
        }
    }

    pub fn build(mut self) -> LayoutResult<ClassIdAssignment> {
        self.count_descendants();

        self.current_ids.push(0);
        self.num_reserved.push(0);
        let graph = self.graph;
        for &root in graph.roots() {
            self.assign(root)?;
        }
        let num_slots = self.current_ids.len();

        // Types numbered before a slot was opened are outside every range in it.
        for ids in &mut self.slot_ids {
            if !ids.is_empty() {
                ids.resize(num_slots, UNASSIGNED_ID);
            }
        }

        for &ty in graph.height_order() {
            if self.universe.is_type_check_interface(ty) {
                let dim = self.universe.dimension(ty);
                let carrier = graph.root_array_up_to(self.universe, dim);
                self.slot_ids[ty.index()] = self.slot_ids[carrier.index()].clone();
            }
        }

        debug!(num_slots, "class ids assigned");
        Ok(ClassIdAssignment {
            num_slots,
            slot_ids: self.slot_ids,
            checks: self.checks,
        })
    }

    fn count_descendants(&mut self) {
        let graph = self.graph;
        for &ty in graph.height_order().iter().rev() {
            if self.universe.is_type_check_interface(ty) {
                continue;
            }
            let count: u32 = graph
                .class_children(ty)
                .iter()
                .map(|child| 1 + self.num_descendants[child.index()])
                .sum();
            self.num_descendants[ty.index()] = count;
        }
    }

    fn assign(&mut self, ty: TypeId) -> LayoutResult<()> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.assign_inner(ty))
    }

    fn assign_inner(&mut self, ty: TypeId) -> LayoutResult<()> {
        let state = self.open_type_state(self.num_descendants[ty.index()]);
        trace!(
            ty = %self.universe.name(ty),
            slot = state.slot,
            assigned = state.assigned,
            max = state.max_subtype,
            reserved = state.reserved,
            "class id"
        );
        self.slot_ids[ty.index()] = self.current_ids.iter().map(|&id| id as u16).collect();

        let graph = self.graph;
        for &child in graph.class_children(ty) {
            self.assign(child)?;
        }

        if self.current_ids[state.slot] != state.max_subtype {
            return Err(LayoutError::structural(format!(
                "class ids below {} end at {} in slot {}, expected {}",
                self.universe.name(ty),
                self.current_ids[state.slot],
                state.slot,
                state.max_subtype
            )));
        }

        self.checks[ty.index()] = Some(RangeCheck {
            slot: slot_number(state.slot)?,
            start: state.assigned as u16,
            range: (state.max_subtype - state.assigned + 1) as u16,
        });

        if state.reserved != 0 {
            if self.num_reserved[state.slot] != state.reserved {
                return Err(LayoutError::structural(format!(
                    "reservation of {} released out of order",
                    self.universe.name(ty)
                )));
            }
            let remaining = state.reserved - 1;
            self.num_reserved[state.slot] = remaining;
            self.current_ids[state.slot] = self.end_value(remaining);
        }
        Ok(())
    }

    /// Id left in a slot once nothing more is numbered in it.
    fn end_value(&self, num_reserved: u32) -> u32 {
        if num_reserved == 0 {
            0
        } else {
            self.capacity - num_reserved
        }
    }

    /// Close the last slot and open an empty one.
    fn open_slot(&mut self) -> usize {
        let last = self.current_ids.len() - 1;
        self.current_ids[last] = self.end_value(self.num_reserved[last]);
        self.current_ids.push(0);
        self.num_reserved.push(0);
        last + 1
    }

    fn open_type_state(&mut self, num_descendants: u32) -> TypeState {
        let mut slot = self.current_ids.len() - 1;
        let mut assigned = self.current_ids[slot] + 1;
        let mut capacity = self.capacity - self.num_reserved[slot];
        debug_assert!(assigned <= capacity);

        if assigned == capacity {
            slot = self.open_slot();
            capacity = self.capacity;
            assigned = 1;
        }

        let mut max_subtype = assigned + num_descendants;
        let mut reserved = 0;
        if max_subtype >= capacity {
            if assigned + 1 == capacity {
                // No room for both this type and a reservation.
                slot = self.open_slot();
                capacity = self.capacity;
                assigned = 1;
                max_subtype = assigned + num_descendants;
            }
            if max_subtype >= capacity {
                self.num_reserved[slot] += 1;
                reserved = self.num_reserved[slot];
                max_subtype = self.capacity - reserved;
            }
        }

        self.current_ids[slot] = assigned;
        TypeState {
            slot,
            assigned,
            max_subtype,
            reserved,
        }
    }
}

pub(crate) fn slot_number(slot: usize) -> LayoutResult<u16> {
    u16::try_from(slot).map_err(|_| {
        LayoutError::structural(format!("slot number {slot} does not fit in 16 bits"))
    })
}

#[cfg(test)]
#[path = "../tests/class_ids_tests.rs"]
mod tests;
