//! The analyzed program's type universe.
//!
//! A `TypeUniverse` is the frozen input of a layout build: every type the
//! points-to analysis saw, its declared supertypes, the methods it declares
//! and which of them survived the analysis. It is produced by
//! [`UniverseBuilder::finish`](crate::UniverseBuilder::finish), which checks
//! the declared hierarchy and derives the lookup tables kept here.
//!
//! Types and methods are addressed by dense `TypeId` / `MethodId` indices into
//! the universe's arenas.

use bitflags::bitflags;
use hubforge_common::{MethodId, Selector, TypeId};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

// =============================================================================
// Flags
// =============================================================================

bitflags! {
    /// Analysis facts about a type.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u8 {
        /// Seen by the analysis; only reachable types take part in a layout.
        const REACHABLE = 1 << 0;
        /// Some allocation of exactly this type may exist at run time.
        const INSTANTIATED = 1 << 1;
        /// Declared abstract; never instantiated directly.
        const ABSTRACT = 1 << 2;
    }
}

bitflags! {
    /// Analysis facts about a method.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MethodFlags: u8 {
        /// Declared without a body.
        const ABSTRACT = 1 << 0;
        /// Some virtual call site targets this declaration.
        const INVOKED = 1 << 1;
        /// The body is reachable and gets compiled.
        const LIVE = 1 << 2;
        /// Always dispatch through a table slot, even with one implementation.
        const FORCE_INDIRECT = 1 << 3;
    }
}

// =============================================================================
// Types
// =============================================================================

/// What kind of type a universe entry is.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A primitive type; a root of its own with no supertypes.
    Primitive,
    /// An ordinary or abstract class.
    Class,
    /// An interface.
    Interface,
    /// An array type; `component` names the element type.
    Array,
}

/// One type of the universe.
#[derive(Clone, Debug)]
pub struct TypeInfo {
    pub name: String,
    pub kind: TypeKind,
    pub flags: TypeFlags,
    /// Direct superclass. `None` for primitives, interfaces and the root
    /// class; arrays report the root class.
    pub superclass: Option<TypeId>,
    /// Directly implemented (classes) or extended (interfaces) interfaces.
    /// Arrays list the array interfaces.
    pub interfaces: SmallVec<[TypeId; 4]>,
    /// Element type of an array.
    pub component: Option<TypeId>,
    /// The array type whose component is this type, if the universe has one.
    pub array_type: Option<TypeId>,
    /// Declared methods in declaration order.
    pub methods: Vec<MethodId>,
}

impl TypeInfo {
    pub fn is_reachable(&self) -> bool {
        self.flags.contains(TypeFlags::REACHABLE)
    }

    pub fn is_instantiated(&self) -> bool {
        self.flags.contains(TypeFlags::INSTANTIATED)
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn is_array(&self) -> bool {
        self.kind == TypeKind::Array
    }

    pub fn is_primitive(&self) -> bool {
        self.kind == TypeKind::Primitive
    }
}

/// One declared method.
#[derive(Clone, Debug)]
pub struct MethodInfo {
    pub name: String,
    pub selector: Selector,
    pub declaring_type: TypeId,
    pub flags: MethodFlags,
    /// Every method a virtual call of this declaration may reach at run time,
    /// sorted by `MethodId`.
    pub implementations: Vec<MethodId>,
}

impl MethodInfo {
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(MethodFlags::ABSTRACT)
    }

    pub fn is_live(&self) -> bool {
        self.flags.contains(MethodFlags::LIVE)
    }

    /// Whether some call may dispatch on this declaration.
    pub fn is_dispatched(&self) -> bool {
        self.flags
            .intersects(MethodFlags::INVOKED | MethodFlags::LIVE)
    }

    /// Whether virtual calls need a table slot for this declaration.
    pub fn needs_dispatch_slot(&self) -> bool {
        self.is_dispatched()
            && (self.implementations.len() > 1
                || (self.flags.contains(MethodFlags::FORCE_INDIRECT)
                    && !self.implementations.is_empty()))
    }
}

// =============================================================================
// TypeUniverse
// =============================================================================

/// Frozen type universe.
#[derive(Clone, Debug)]
pub struct TypeUniverse {
    pub(crate) types: Vec<TypeInfo>,
    pub(crate) methods: Vec<MethodInfo>,
    pub(crate) root: TypeId,
    pub(crate) array_interfaces: SmallVec<[TypeId; 2]>,
    /// Declared direct subtypes, sorted.
    pub(crate) declared_subtypes: Vec<Vec<TypeId>>,
    /// All transitively implemented interfaces (excluding the type itself),
    /// sorted.
    pub(crate) interface_closure: Vec<Vec<TypeId>>,
    pub(crate) declared_by_selector: FxHashMap<(TypeId, Selector), MethodId>,
    pub(crate) selector_names: Vec<String>,
}

impl TypeUniverse {
    /// Number of types, reachable or not.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn num_methods(&self) -> usize {
        self.methods.len()
    }

    pub fn ty(&self, id: TypeId) -> &TypeInfo {
        &self.types[id.index()]
    }

    pub fn method(&self, id: MethodId) -> &MethodInfo {
        &self.methods[id.index()]
    }

    /// All type ids in arena order.
    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        (0..self.types.len()).map(TypeId::from_index)
    }

    pub fn method_ids(&self) -> impl Iterator<Item = MethodId> + '_ {
        (0..self.methods.len()).map(MethodId::from_index)
    }

    /// The root class every class and array descends from.
    pub fn root(&self) -> TypeId {
        self.root
    }

    /// Interfaces every array type implements.
    pub fn array_interfaces(&self) -> &[TypeId] {
        &self.array_interfaces
    }

    pub fn name(&self, id: TypeId) -> &str {
        &self.types[id.index()].name
    }

    /// `Declaring.name` of a method, for diagnostics.
    pub fn qualified_method_name(&self, id: MethodId) -> String {
        let method = self.method(id);
        format!("{}.{}", self.name(method.declaring_type), method.name)
    }

    pub fn selector_name(&self, selector: Selector) -> &str {
        &self.selector_names[selector.0 as usize]
    }

    pub fn find_type(&self, name: &str) -> Option<TypeId> {
        self.types
            .iter()
            .position(|info| info.name == name)
            .map(TypeId::from_index)
    }

    /// Method declared by `ty` itself under `selector`.
    pub fn declared_method(&self, ty: TypeId, selector: Selector) -> Option<MethodId> {
        self.declared_by_selector.get(&(ty, selector)).copied()
    }

    /// Direct subtypes in the declared hierarchy: subclasses, implementers,
    /// subinterfaces, and array types under the root class and the array
    /// interfaces. Includes unreachable types.
    pub fn declared_subtypes(&self, id: TypeId) -> &[TypeId] {
        &self.declared_subtypes[id.index()]
    }

    /// Transitive superinterfaces of `id`, sorted, not including `id`.
    pub fn all_interfaces(&self, id: TypeId) -> &[TypeId] {
        &self.interface_closure[id.index()]
    }

    /// `id` itself plus everything below it in the declared hierarchy.
    pub fn declared_subtype_closure(&self, id: TypeId) -> Vec<TypeId> {
        let mut seen = vec![false; self.types.len()];
        let mut stack = vec![id];
        let mut out = Vec::new();
        seen[id.index()] = true;
        while let Some(ty) = stack.pop() {
            out.push(ty);
            for &sub in self.declared_subtypes(ty) {
                if !seen[sub.index()] {
                    seen[sub.index()] = true;
                    stack.push(sub);
                }
            }
        }
        out.sort_unstable();
        out
    }

    /// Superclass chain starting at `id` (inclusive).
    pub fn superclass_chain(&self, id: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        std::iter::successors(Some(id), move |&ty| self.ty(ty).superclass)
    }

    /// Number of array levels: 0 for non-arrays, 2 for `A[][]`.
    pub fn dimension(&self, id: TypeId) -> u32 {
        let mut dim = 0;
        let mut ty = id;
        while let Some(component) = self.ty(ty).component {
            dim += 1;
            ty = component;
        }
        dim
    }

    /// Innermost element type of an array, or `id` itself.
    pub fn element_type(&self, id: TypeId) -> TypeId {
        let mut ty = id;
        while let Some(component) = self.ty(ty).component {
            ty = component;
        }
        ty
    }

    /// The `dim`-dimensional array of `element`, if the universe has it.
    pub fn array_of(&self, element: TypeId, dim: u32) -> Option<TypeId> {
        let mut ty = element;
        for _ in 0..dim {
            ty = self.ty(ty).array_type?;
        }
        Some(ty)
    }

    /// Interfaces and arrays of interfaces. These are numbered by the
    /// interface id assigner; everything else gets class ids.
    pub fn is_type_check_interface(&self, id: TypeId) -> bool {
        self.ty(self.element_type(id)).is_interface()
    }
}
