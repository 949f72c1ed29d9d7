//! Open-world dispatch tables.
//!
//! Types may be added after the build, so no slot can be reused across
//! subtrees. Every class inherits its superclass's class segment and appends
//! one index per newly introduced selector; an override keeps the inherited
//! index. Each instantiated type then appends one itable segment per
//! implemented interface, and records where each segment starts.

use crate::table::{DispatchEntry, DispatchLayout, DispatchTable};
use hubforge_common::limits::{STACK_GROW_SIZE, STACK_RED_ZONE};
use hubforge_common::{LayoutError, LayoutResult, MethodId, Selector, TypeId, WorldMode};
use hubforge_hierarchy::TypeUniverse;
use indexmap::IndexMap;
use tracing::{debug, info_span};

/// Selector to latest declaration, in index order.
type ClassSegment = IndexMap<Selector, MethodId>;

pub struct OpenWorldBuilder<'a> {
    universe: &'a TypeUniverse,
    layout: DispatchLayout,
}

impl<'a> OpenWorldBuilder<'a> {
    pub fn new(universe: &'a TypeUniverse) -> Self {
        Self {
            universe,
            layout: DispatchLayout::new(WorldMode::Open, universe.len(), universe.num_methods()),
        }
    }

    pub fn build(mut self) -> LayoutResult<DispatchLayout> {
        let _span = info_span!("open_world_tables").entered();
        let universe = self.universe;

        for ty in universe.type_ids() {
            if !universe.ty(ty).is_interface() {
                continue;
            }
            for (position, &method) in universe.ty(ty).methods.iter().enumerate() {
                self.layout.itable_index[method.index()] = Some(index_u32(position)?);
            }
        }

        let root = universe.root();
        let mut root_segment = ClassSegment::default();
        self.extend_segment(root, &mut root_segment)?;
        self.emit_table(root, &root_segment)?;
        self.visit_classes(root, &root_segment)?;

        debug!(
            entries = self.layout.total_entries(),
            "open world tables built"
        );
        Ok(self.layout)
    }

    /// Unreachable classes get no table but still pass their declarations
    /// down to reachable subclasses.
    fn visit_classes(&mut self, ty: TypeId, segment: &ClassSegment) -> LayoutResult<()> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            let universe = self.universe;
            for &sub in universe.declared_subtypes(ty) {
                let info = universe.ty(sub);
                if info.is_interface() {
                    continue;
                }
                let mut sub_segment = segment.clone();
                self.extend_segment(sub, &mut sub_segment)?;
                if info.is_reachable() {
                    self.emit_table(sub, &sub_segment)?;
                }
                self.visit_classes(sub, &sub_segment)?;
            }
            Ok(())
        })
    }

    /// Add `ty`'s declared methods to the inherited segment.
    fn extend_segment(&mut self, ty: TypeId, segment: &mut ClassSegment) -> LayoutResult<()> {
        let universe = self.universe;
        for &method in &universe.ty(ty).methods {
            let (index, _) = segment.insert_full(universe.method(method).selector, method);
            self.layout.vtable_index[method.index()] = Some(index_u32(index)?);
        }
        Ok(())
    }

    /// Class segment followed by the itables of every implemented interface.
    fn emit_table(&mut self, ty: TypeId, segment: &ClassSegment) -> LayoutResult<()> {
        let universe = self.universe;
        let info = universe.ty(ty);
        if !info.is_instantiated() {
            return Ok(());
        }

        let mut entries: Vec<DispatchEntry> = segment
            .values()
            .map(|&method| DispatchEntry::from_target(universe.resolve_method(ty, method)))
            .collect();

        let mut offsets = Vec::with_capacity(universe.all_interfaces(ty).len());
        for &iface in universe.all_interfaces(ty) {
            offsets.push((iface, index_u32(entries.len())?));
            entries.extend(
                universe
                    .ty(iface)
                    .methods
                    .iter()
                    .map(|&method| DispatchEntry::from_target(universe.resolve_method(ty, method))),
            );
        }

        self.layout.itable_offsets[ty.index()] = offsets;
        self.layout.tables[ty.index()] = DispatchTable { entries };
        Ok(())
    }
}

fn index_u32(index: usize) -> LayoutResult<u32> {
    u32::try_from(index)
        .map_err(|_| LayoutError::structural(format!("dispatch index {index} does not fit in u32")))
}

#[cfg(test)]
#[path = "../tests/open_world_tests.rs"]
mod tests;
