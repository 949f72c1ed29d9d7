//! Naive assignability over the declared hierarchy.
//!
//! This is the reference the compact type checks are validated against. It
//! rebuilds the full ancestor set of a type on every call, so it is only meant
//! for validation and tests.

use crate::universe::{TypeKind, TypeUniverse};
use fixedbitset::FixedBitSet;
use hubforge_common::TypeId;

pub struct AssignabilityOracle<'a> {
    universe: &'a TypeUniverse,
}

impl<'a> AssignabilityOracle<'a> {
    pub fn new(universe: &'a TypeUniverse) -> Self {
        Self { universe }
    }

    /// Every type a value of type `ty` can be assigned to, `ty` included.
    ///
    /// Arrays are covariant in their component: `B[]` is an ancestor of `A[]`
    /// whenever `B` is an ancestor of `A` and `B[]` exists. Primitive arrays
    /// only reach the root class and the array interfaces.
    pub fn ancestors(&self, ty: TypeId) -> FixedBitSet {
        let universe = self.universe;
        let mut set = FixedBitSet::with_capacity(universe.len());
        set.insert(ty.index());

        let info = universe.ty(ty);
        if info.kind == TypeKind::Primitive {
            return set;
        }

        set.insert(universe.root().index());
        for class in universe.superclass_chain(ty) {
            set.insert(class.index());
        }
        for &iface in universe.all_interfaces(ty) {
            set.insert(iface.index());
        }

        if let Some(component) = info.component {
            if !universe.ty(component).is_primitive() {
                let component_ancestors = self.ancestors(component);
                for ancestor in component_ancestors.ones() {
                    if let Some(array) = universe.ty(TypeId::from_index(ancestor)).array_type {
                        set.insert(array.index());
                    }
                }
            }
        }
        set
    }

    /// Whether a value of type `checked` may be stored in a `super_type`
    /// location.
    pub fn is_assignable(&self, super_type: TypeId, checked: TypeId) -> bool {
        self.ancestors(checked).contains(super_type.index())
    }
}

#[cfg(test)]
#[path = "../tests/assignability_tests.rs"]
mod tests;
