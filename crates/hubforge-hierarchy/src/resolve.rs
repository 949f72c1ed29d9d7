//! Virtual method resolution.
//!
//! Resolution follows the usual single-inheritance-plus-default-methods rule:
//! the nearest declaration on the superclass chain wins; only if the chain has
//! none are interface declarations considered, and then exactly one maximally
//! specific, non-abstract declaration must exist.

use crate::universe::TypeUniverse;
use hubforge_common::{MethodId, TypeId};
use smallvec::SmallVec;

impl TypeUniverse {
    /// The concrete method a virtual call of `method` on a receiver of exact
    /// type `ty` runs, ignoring whether that method survived the analysis.
    ///
    /// Returns `None` for interfaces and primitives, when the selected
    /// declaration is abstract, or when interface declarations are ambiguous.
    pub fn resolve_concrete(&self, ty: TypeId, method: MethodId) -> Option<MethodId> {
        let info = self.ty(ty);
        if info.is_interface() || info.is_primitive() {
            return None;
        }
        let selector = self.method(method).selector;

        for class in self.superclass_chain(ty) {
            if let Some(found) = self.declared_method(class, selector) {
                return (!self.method(found).is_abstract()).then_some(found);
            }
        }

        let candidates: SmallVec<[MethodId; 4]> = self
            .all_interfaces(ty)
            .iter()
            .filter_map(|&iface| self.declared_method(iface, selector))
            .collect();
        let mut most_specific = candidates.iter().copied().filter(|&candidate| {
            let owner = self.method(candidate).declaring_type;
            !candidates.iter().any(|&other| {
                let other_owner = self.method(other).declaring_type;
                other_owner != owner
                    && self.all_interfaces(other_owner).binary_search(&owner).is_ok()
            })
        });
        let first = most_specific.next()?;
        if most_specific.next().is_some() || self.method(first).is_abstract() {
            return None;
        }
        Some(first)
    }

    /// Like `resolve_concrete`, but only returns methods that are compiled.
    pub fn resolve_method(&self, ty: TypeId, method: MethodId) -> Option<MethodId> {
        self.resolve_concrete(ty, method)
            .filter(|&target| self.method(target).is_live())
    }
}

#[cfg(test)]
#[path = "../tests/resolve_tests.rs"]
mod tests;
