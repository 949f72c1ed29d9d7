//! Dispatch tables and the lookup API over them.

use hubforge_common::{MethodId, TypeId, WorldMode};
use hubforge_hierarchy::TypeUniverse;
use serde::Serialize;

/// One entry of a dispatch table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchEntry {
    /// Jump to this method.
    Method(MethodId),
    /// The invalid-call stub. Written wherever no target exists so a call
    /// through a stale or impossible slot faults instead of jumping to null.
    Trap,
}

impl DispatchEntry {
    pub fn from_target(target: Option<MethodId>) -> Self {
        target.map_or(DispatchEntry::Trap, DispatchEntry::Method)
    }

    pub fn method(self) -> Option<MethodId> {
        match self {
            DispatchEntry::Method(method) => Some(method),
            DispatchEntry::Trap => None,
        }
    }

    /// `Declaring.name` of the target, or `trap`.
    pub fn describe(self, universe: &TypeUniverse) -> String {
        match self {
            DispatchEntry::Method(method) => universe.qualified_method_name(method),
            DispatchEntry::Trap => "trap".to_string(),
        }
    }
}

/// Dispatch table of one type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DispatchTable {
    pub entries: Vec<DispatchEntry>,
}

impl DispatchTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`; positions past the end read as `Trap`.
    pub fn entry(&self, index: u32) -> DispatchEntry {
        self.entries
            .get(index as usize)
            .copied()
            .unwrap_or(DispatchEntry::Trap)
    }
}

/// Dispatch tables of every type plus the per-method indices calls use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchLayout {
    pub(crate) world: WorldMode,
    /// Indexed by `TypeId`. Empty for types that are never a receiver.
    pub(crate) tables: Vec<DispatchTable>,
    /// Indexed by `MethodId`. Closed world: the vtable slot, for methods that
    /// need one. Open world: the class segment index of class methods.
    pub(crate) vtable_index: Vec<Option<u32>>,
    /// Indexed by `MethodId`; open world interface methods only.
    pub(crate) itable_index: Vec<Option<u32>>,
    /// Indexed by `TypeId`; `(interface, offset)` sorted by interface.
    pub(crate) itable_offsets: Vec<Vec<(TypeId, u32)>>,
}

impl DispatchLayout {
    pub(crate) fn new(world: WorldMode, num_types: usize, num_methods: usize) -> Self {
        Self {
            world,
            tables: vec![DispatchTable::default(); num_types],
            vtable_index: vec![None; num_methods],
            itable_index: vec![None; num_methods],
            itable_offsets: vec![Vec::new(); num_types],
        }
    }

    pub fn world(&self) -> WorldMode {
        self.world
    }

    pub fn table(&self, ty: TypeId) -> &DispatchTable {
        &self.tables[ty.index()]
    }

    pub fn tables(&self) -> impl Iterator<Item = (TypeId, &DispatchTable)> + '_ {
        self.tables
            .iter()
            .enumerate()
            .map(|(index, table)| (TypeId::from_index(index), table))
    }

    /// Total number of entries over all tables.
    pub fn total_entries(&self) -> usize {
        self.tables.iter().map(DispatchTable::len).sum()
    }

    pub fn vtable_index(&self, method: MethodId) -> Option<u32> {
        self.vtable_index.get(method.index()).copied().flatten()
    }

    /// Position of an interface method inside its interface's itable segment.
    pub fn itable_index(&self, method: MethodId) -> Option<u32> {
        self.itable_index.get(method.index()).copied().flatten()
    }

    /// Start of `iface`'s itable segment in `ty`'s table (open world).
    pub fn itable_offset(&self, ty: TypeId, iface: TypeId) -> Option<u32> {
        let offsets = self.itable_offsets.get(ty.index())?;
        offsets
            .binary_search_by_key(&iface, |&(candidate, _)| candidate)
            .ok()
            .map(|found| offsets[found].1)
    }

    pub fn itable_offsets(&self, ty: TypeId) -> &[(TypeId, u32)] {
        &self.itable_offsets[ty.index()]
    }

    /// Entry a virtual call of `method` on a receiver of exact type `ty`
    /// loads. `None` if the method has no table index (calls are direct).
    pub fn resolve_virtual_call(&self, ty: TypeId, method: MethodId) -> Option<DispatchEntry> {
        let index = self.vtable_index(method)?;
        Some(self.table(ty).entry(index))
    }

    /// Entry an interface call of `method` on a receiver of exact type `ty`
    /// loads. In the closed world interface methods live in the vtable; in
    /// the open world the call goes through `ty`'s itable segment for the
    /// declaring interface.
    pub fn resolve_interface_call(
        &self,
        universe: &TypeUniverse,
        ty: TypeId,
        method: MethodId,
    ) -> Option<DispatchEntry> {
        let declaring = universe.method(method).declaring_type;
        if self.world == WorldMode::Closed || !universe.ty(declaring).is_interface() {
            return self.resolve_virtual_call(ty, method);
        }
        let offset = self.itable_offset(ty, declaring)?;
        let index = self.itable_index(method)?;
        Some(self.table(ty).entry(offset + index))
    }
}

#[cfg(test)]
#[path = "../tests/table_tests.rs"]
mod tests;
