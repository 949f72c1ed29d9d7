//! Dispatch table verification.
//!
//! Every call a reachable receiver can make through a table is replayed
//! against method resolution: for each method with a table index and each
//! instantiated type below its declaring type, the loaded entry must be the
//! resolved target, or `Trap` when resolution finds none.

use crate::table::{DispatchEntry, DispatchLayout};
use hubforge_common::{LayoutError, LayoutResult, MethodId, TypeId, WorldMode};
use hubforge_hierarchy::TypeUniverse;
use tracing::{debug, info_span};

pub struct DispatchValidator<'a> {
    universe: &'a TypeUniverse,
    layout: &'a DispatchLayout,
}

impl<'a> DispatchValidator<'a> {
    pub fn new(universe: &'a TypeUniverse, layout: &'a DispatchLayout) -> Self {
        Self { universe, layout }
    }

    pub fn verify(&self) -> LayoutResult<()> {
        let _span = info_span!("verify_dispatch", world = ?self.layout.world()).entered();
        let mut checked = 0usize;
        for method in self.universe.method_ids() {
            let info = self.universe.method(method);
            if !self.has_index(method) {
                if self.layout.world() == WorldMode::Closed
                    && info.needs_dispatch_slot()
                    && self.universe.ty(info.declaring_type).is_reachable()
                {
                    return Err(LayoutError::structural(format!(
                        "{} needs a vtable slot but has none",
                        self.universe.qualified_method_name(method)
                    )));
                }
                continue;
            }
            for ty in self.universe.declared_subtype_closure(info.declaring_type) {
                let receiver = self.universe.ty(ty);
                if !receiver.is_instantiated() || !receiver.is_reachable() {
                    continue;
                }
                self.verify_call(ty, method)?;
                checked += 1;
            }
        }
        if self.layout.world() == WorldMode::Closed {
            self.verify_no_trailing_traps()?;
        }
        debug!(checked, "dispatch tables verified");
        Ok(())
    }

    fn has_index(&self, method: MethodId) -> bool {
        self.layout.vtable_index(method).is_some() || self.layout.itable_index(method).is_some()
    }

    fn verify_call(&self, ty: TypeId, method: MethodId) -> LayoutResult<()> {
        let expected = DispatchEntry::from_target(self.universe.resolve_method(ty, method));
        let declaring = self.universe.method(method).declaring_type;
        let (slot, actual) = if self.universe.ty(declaring).is_interface() {
            let slot = match self.layout.world() {
                WorldMode::Closed => self.layout.vtable_index(method),
                WorldMode::Open => self
                    .layout
                    .itable_offset(ty, declaring)
                    .zip(self.layout.itable_index(method))
                    .map(|(offset, index)| offset + index),
            };
            (slot, self.layout.resolve_interface_call(self.universe, ty, method))
        } else {
            (
                self.layout.vtable_index(method),
                self.layout.resolve_virtual_call(ty, method),
            )
        };

        match actual {
            Some(actual) if actual == expected => Ok(()),
            actual => Err(LayoutError::DispatchMismatch {
                type_name: self.universe.name(ty).to_string(),
                slot: slot.unwrap_or(u32::MAX),
                method: self.universe.qualified_method_name(method),
                expected: expected.describe(self.universe),
                actual: actual.map_or_else(|| "no entry".to_string(), |entry| entry.describe(self.universe)),
            }),
        }
    }

    fn verify_no_trailing_traps(&self) -> LayoutResult<()> {
        for (ty, table) in self.layout.tables() {
            if table.entries.last() == Some(&DispatchEntry::Trap) {
                return Err(LayoutError::structural(format!(
                    "vtable of {} ends in a trap entry",
                    self.universe.name(ty)
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/validator_tests.rs"]
mod tests;
