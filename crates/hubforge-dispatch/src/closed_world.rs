//! Closed-world vtables.
//!
//! All implementations are known, so a method only needs a slot when a call
//! can reach more than one of them; single-implementation calls become direct
//! calls. Slots are numbered per method, not per class, and the same slot
//! number is reused by methods of unrelated subtrees.
//!
//! Methods are processed in three rounds to keep filler entries rare:
//!
//! 1. the root class, whose methods sit in every vtable and must not be
//!    preceded by fillers;
//! 2. interfaces by descending importance (size of their declared subtype
//!    closure), because an interface slot must be free in every implementer;
//! 3. all other classes, depth first from the root.
//!
//! A method first tries a slot every implementation already occupies, as long
//! as no other receiver below its declaring type has claimed it. Failing
//! that it takes the lowest slot free in every type below its declaring type
//! and below the declaring types of its implementations.

use crate::table::{DispatchEntry, DispatchLayout, DispatchTable};
use fixedbitset::FixedBitSet;
use hubforge_common::limits::{STACK_GROW_SIZE, STACK_RED_ZONE};
use hubforge_common::{LayoutError, LayoutResult, MethodId, TypeId, WorldMode};
use hubforge_hierarchy::{SubtypeGraph, TypeUniverse};
use smallvec::SmallVec;
use tracing::{debug, info_span, trace};

pub struct ClosedWorldBuilder<'a> {
    universe: &'a TypeUniverse,
    graph: &'a SubtypeGraph,
    /// Mutable vtables; `None` is a filler.
    vtables: Vec<Vec<Option<MethodId>>>,
    /// Occupied slots per type.
    used_slots: Vec<FixedBitSet>,
    /// Slots each implementation already fills. An implementation can sit in
    /// several slots when it implements methods of several interfaces.
    method_slots: Vec<SmallVec<[u32; 2]>>,
    vtable_index: Vec<Option<u32>>,
    /// Memoized declared subtype closures.
    closures: Vec<Option<Vec<TypeId>>>,
}

impl<'a> ClosedWorldBuilder<'a> {
    pub fn new(universe: &'a TypeUniverse, graph: &'a SubtypeGraph) -> Self {
        let num_types = universe.len();
        let num_methods = universe.num_methods();
        Self {
            universe,
            graph,
            vtables: vec![Vec::new(); num_types],
            used_slots: vec![FixedBitSet::new(); num_types],
            method_slots: vec![SmallVec::new(); num_methods],
            vtable_index: vec![None; num_methods],
            closures: vec![None; num_types],
        }
    }

    pub fn build(mut self) -> LayoutResult<DispatchLayout> {
        let _span = info_span!("closed_world_vtables").entered();
        let root = self.universe.root();

        self.assign_methods_of(root)?;

        for iface in self.interfaces_by_importance() {
            self.assign_methods_of(iface)?;
        }

        self.visit_classes(root)?;

        let mut layout = DispatchLayout::new(
            WorldMode::Closed,
            self.universe.len(),
            self.universe.num_methods(),
        );
        for (index, vtable) in self.vtables.into_iter().enumerate() {
            if vtable.last().is_some_and(Option::is_none) {
                return Err(LayoutError::structural(format!(
                    "vtable of {} ends in a filler entry",
                    self.universe.name(TypeId::from_index(index))
                )));
            }
            layout.tables[index] = DispatchTable {
                entries: vtable.into_iter().map(DispatchEntry::from_target).collect(),
            };
        }
        layout.vtable_index = self.vtable_index;

        debug!(
            slotted_methods = layout.vtable_index.iter().flatten().count(),
            entries = layout.total_entries(),
            "closed world vtables built"
        );
        Ok(layout)
    }

    /// Reachable interfaces, most implemented first. Ties keep height order.
    fn interfaces_by_importance(&mut self) -> Vec<TypeId> {
        let interfaces: Vec<TypeId> = self
            .graph
            .height_order()
            .iter()
            .copied()
            .filter(|&ty| self.universe.ty(ty).is_interface())
            .collect();
        let mut ranked: Vec<(TypeId, usize)> = interfaces
            .into_iter()
            .map(|iface| (iface, self.closure(iface).len()))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.into_iter().map(|(iface, _)| iface).collect()
    }

    /// Depth first over classes and arrays below `ty`; `ty`'s own methods are
    /// assigned by the caller. Unreachable classes are walked through without
    /// assigning their methods.
    fn visit_classes(&mut self, ty: TypeId) -> LayoutResult<()> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            let universe = self.universe;
            for &sub in universe.declared_subtypes(ty) {
                let info = universe.ty(sub);
                if info.is_interface() {
                    continue;
                }
                if info.is_reachable() {
                    self.assign_methods_of(sub)?;
                }
                self.visit_classes(sub)?;
            }
            Ok(())
        })
    }

    fn assign_methods_of(&mut self, ty: TypeId) -> LayoutResult<()> {
        let universe = self.universe;
        for &method in &universe.ty(ty).methods {
            if self.vtable_index[method.index()].is_some()
                || !universe.method(method).needs_dispatch_slot()
            {
                continue;
            }
            let slot = self.find_slot(method);
            self.vtable_index[method.index()] = Some(slot);
            trace!(
                method = %universe.qualified_method_name(method),
                slot,
                "vtable slot assigned"
            );
            self.fill_entries(method, slot)?;
        }
        Ok(())
    }

    fn find_slot(&mut self, method: MethodId) -> u32 {
        let universe = self.universe;
        let info = universe.method(method);

        for slot in self.shared_slots(&info.implementations) {
            if self.slot_fits(method, slot) {
                self.mark_used(info.declaring_type, slot as usize);
                return slot;
            }
        }

        let mut affected = FixedBitSet::with_capacity(universe.len());
        let owners = std::iter::once(info.declaring_type).chain(
            info.implementations
                .iter()
                .map(|&implementation| universe.method(implementation).declaring_type),
        );
        for owner in owners {
            for &ty in self.closure(owner) {
                affected.insert(ty.index());
            }
        }

        let mut used = FixedBitSet::new();
        for ty in affected.ones() {
            used.union_with(&self.used_slots[ty]);
        }
        let slot = (0..used.len())
            .find(|&slot| !used.contains(slot))
            .unwrap_or(used.len());

        for ty in affected.ones() {
            let set = &mut self.used_slots[ty];
            set.grow(slot + 1);
            set.insert(slot);
        }
        let slot = slot as u32;
        for &implementation in &info.implementations {
            self.method_slots[implementation.index()].push(slot);
        }
        slot
    }

    /// Slots every implementation already fills, lowest first.
    fn shared_slots(&self, implementations: &[MethodId]) -> SmallVec<[u32; 2]> {
        let Some((first, rest)) = implementations.split_first() else {
            return SmallVec::new();
        };
        let mut slots: SmallVec<[u32; 2]> = self.method_slots[first.index()]
            .iter()
            .copied()
            .filter(|slot| {
                rest.iter()
                    .all(|other| self.method_slots[other.index()].contains(slot))
            })
            .collect();
        slots.sort_unstable();
        slots
    }

    /// Whether `slot` can hold `method` in every instantiated type below its
    /// declaring type. An occupied entry must already hold the resolved
    /// target; a claimed empty entry is a trap for some other method and only
    /// fits a receiver that has no target either.
    fn slot_fits(&mut self, method: MethodId, slot: u32) -> bool {
        let universe = self.universe;
        let declaring = universe.method(method).declaring_type;
        let slot = slot as usize;
        let receivers: Vec<TypeId> = self.closure(declaring).to_vec();
        receivers.into_iter().all(|ty| {
            let info = universe.ty(ty);
            if !info.is_instantiated() || !info.is_reachable() {
                return true;
            }
            let target = universe.resolve_method(ty, method);
            match self.vtables[ty.index()].get(slot).copied().flatten() {
                Some(existing) => target == Some(existing),
                None => target.is_none() || !self.used_slots[ty.index()].contains(slot),
            }
        })
    }

    fn mark_used(&mut self, declaring: TypeId, slot: usize) {
        let receivers: Vec<TypeId> = self.closure(declaring).to_vec();
        for ty in receivers {
            let set = &mut self.used_slots[ty.index()];
            set.grow(slot + 1);
            set.insert(slot);
        }
    }

    /// Write the resolved target of `method` into every instantiated type
    /// below its declaring type.
    fn fill_entries(&mut self, method: MethodId, slot: u32) -> LayoutResult<()> {
        let universe = self.universe;
        let declaring = universe.method(method).declaring_type;
        let slot = slot as usize;
        let receivers: Vec<TypeId> = self.closure(declaring).to_vec();
        for ty in receivers {
            let info = universe.ty(ty);
            if !info.is_instantiated() || !info.is_reachable() {
                continue;
            }
            let Some(target) = universe.resolve_method(ty, method) else {
                continue;
            };
            let vtable = &mut self.vtables[ty.index()];
            match vtable.get(slot).copied().flatten() {
                Some(existing) if existing != target => {
                    return Err(LayoutError::structural(format!(
                        "vtable slot {slot} of {} holds {} but {} resolves to {}",
                        universe.name(ty),
                        universe.qualified_method_name(existing),
                        universe.qualified_method_name(method),
                        universe.qualified_method_name(target)
                    )));
                }
                Some(_) => {}
                None => {
                    if vtable.len() <= slot {
                        vtable.resize(slot + 1, None);
                    }
                    vtable[slot] = Some(target);
                }
            }
        }
        Ok(())
    }

    fn closure(&mut self, ty: TypeId) -> &[TypeId] {
        let universe = self.universe;
        self.closures[ty.index()].get_or_insert_with(|| universe.declared_subtype_closure(ty))
    }
}

#[cfg(test)]
#[path = "../tests/closed_world_tests.rs"]
mod tests;
