//! Incremental construction of a `TypeUniverse`.
//!
//! The builder mirrors what an analysis front end reports: types with their
//! declared supertypes, declared methods and the analysis flags on both.
//! `finish` checks the declared hierarchy, derives the lookup tables and, for
//! every method whose implementation set was not supplied, computes it by
//! resolving the method on each instantiated subtype of its declaring type.

use crate::universe::{MethodFlags, MethodInfo, TypeFlags, TypeInfo, TypeKind, TypeUniverse};
use hubforge_common::{LayoutError, LayoutResult, MethodId, Selector, TypeId};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::debug;

/// Builder for a `TypeUniverse`. Every type it creates starts out reachable.
#[derive(Debug)]
pub struct UniverseBuilder {
    types: Vec<TypeInfo>,
    methods: Vec<MethodInfo>,
    explicit_implementations: Vec<bool>,
    selectors: IndexMap<String, Selector>,
    root: TypeId,
    array_interfaces: SmallVec<[TypeId; 2]>,
}

impl UniverseBuilder {
    /// Start a universe whose root class is called `root_name`.
    pub fn new(root_name: &str) -> Self {
        let mut builder = Self {
            types: Vec::new(),
            methods: Vec::new(),
            explicit_implementations: Vec::new(),
            selectors: IndexMap::new(),
            root: TypeId(0),
            array_interfaces: SmallVec::new(),
        };
        builder.root = builder.push_type(root_name, TypeKind::Class, None, &[], None);
        builder
    }

    pub fn root(&self) -> TypeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn push_type(
        &mut self,
        name: &str,
        kind: TypeKind,
        superclass: Option<TypeId>,
        interfaces: &[TypeId],
        component: Option<TypeId>,
    ) -> TypeId {
        let id = TypeId::from_index(self.types.len());
        self.types.push(TypeInfo {
            name: name.to_string(),
            kind,
            flags: TypeFlags::REACHABLE,
            superclass,
            interfaces: interfaces.iter().copied().collect(),
            component,
            array_type: None,
            methods: Vec::new(),
        });
        id
    }

    pub fn primitive(&mut self, name: &str) -> TypeId {
        self.push_type(name, TypeKind::Primitive, None, &[], None)
    }

    pub fn class(&mut self, name: &str, superclass: TypeId) -> TypeId {
        self.push_type(name, TypeKind::Class, Some(superclass), &[], None)
    }

    pub fn abstract_class(&mut self, name: &str, superclass: TypeId) -> TypeId {
        let id = self.class(name, superclass);
        self.types[id.index()].flags |= TypeFlags::ABSTRACT;
        id
    }

    pub fn interface(&mut self, name: &str, superinterfaces: &[TypeId]) -> TypeId {
        self.push_type(name, TypeKind::Interface, None, superinterfaces, None)
    }

    /// Add directly implemented (or, for interfaces, extended) interfaces.
    pub fn implements(&mut self, ty: TypeId, interfaces: &[TypeId]) {
        let info = &mut self.types[ty.index()];
        for &iface in interfaces {
            if !info.interfaces.contains(&iface) {
                info.interfaces.push(iface);
            }
        }
    }

    /// The array type with component `component`, created on first request.
    pub fn array_of(&mut self, component: TypeId) -> TypeId {
        if let Some(existing) = self.types[component.index()].array_type {
            return existing;
        }
        let name = format!("{}[]", self.types[component.index()].name);
        let root = self.root;
        let id = self.push_type(&name, TypeKind::Array, Some(root), &[], Some(component));
        self.types[component.index()].array_type = Some(id);
        id
    }

    /// The `dim`-dimensional array of `element`, creating missing levels.
    pub fn array_of_dim(&mut self, element: TypeId, dim: u32) -> TypeId {
        let mut ty = element;
        for _ in 0..dim {
            ty = self.array_of(ty);
        }
        ty
    }

    /// Declare an interface every array type implements.
    pub fn array_interface(&mut self, iface: TypeId) {
        if !self.array_interfaces.contains(&iface) {
            self.array_interfaces.push(iface);
        }
    }

    pub fn instantiate(&mut self, ty: TypeId) {
        self.types[ty.index()].flags |= TypeFlags::INSTANTIATED;
    }

    pub fn set_reachable(&mut self, ty: TypeId, reachable: bool) {
        self.types[ty.index()]
            .flags
            .set(TypeFlags::REACHABLE, reachable);
    }

    fn intern_selector(&mut self, name: &str) -> Selector {
        let next = Selector(self.selectors.len() as u32);
        *self.selectors.entry(name.to_string()).or_insert(next)
    }

    /// Declare a method on `ty` with explicit flags.
    pub fn method_with_flags(&mut self, ty: TypeId, name: &str, flags: MethodFlags) -> MethodId {
        let selector = self.intern_selector(name);
        let id = MethodId::from_index(self.methods.len());
        self.methods.push(MethodInfo {
            name: name.to_string(),
            selector,
            declaring_type: ty,
            flags,
            implementations: Vec::new(),
        });
        self.explicit_implementations.push(false);
        self.types[ty.index()].methods.push(id);
        id
    }

    /// Declare a concrete method that is both called and compiled.
    pub fn method(&mut self, ty: TypeId, name: &str) -> MethodId {
        self.method_with_flags(ty, name, MethodFlags::INVOKED | MethodFlags::LIVE)
    }

    /// Declare an abstract method that has call sites.
    pub fn abstract_method(&mut self, ty: TypeId, name: &str) -> MethodId {
        self.method_with_flags(ty, name, MethodFlags::ABSTRACT | MethodFlags::INVOKED)
    }

    /// Whether `ty` already declares a method called `name`.
    pub fn declares(&self, ty: TypeId, name: &str) -> bool {
        self.types[ty.index()]
            .methods
            .iter()
            .any(|method| self.methods[method.index()].name == name)
    }

    pub fn set_method_flags(&mut self, method: MethodId, flags: MethodFlags) {
        self.methods[method.index()].flags = flags;
    }

    /// Use `implementations` verbatim instead of computing the set.
    pub fn set_implementations(&mut self, method: MethodId, implementations: &[MethodId]) {
        let mut sorted = implementations.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        self.methods[method.index()].implementations = sorted;
        self.explicit_implementations[method.index()] = true;
    }

    // =========================================================================
    // Finish
    // =========================================================================

    /// Check the declared hierarchy and freeze the universe.
    pub fn finish(mut self) -> LayoutResult<TypeUniverse> {
        self.check_references()?;
        self.check_kinds()?;
        self.check_acyclic()?;

        let array_interfaces = self.array_interfaces.clone();
        for info in &mut self.types {
            if info.kind == TypeKind::Array {
                info.interfaces = array_interfaces.iter().copied().collect();
            }
        }

        let declared_subtypes = self.compute_declared_subtypes();
        let interface_closure = self.compute_interface_closure();

        let mut declared_by_selector = FxHashMap::default();
        for (index, method) in self.methods.iter().enumerate() {
            let key = (method.declaring_type, method.selector);
            if declared_by_selector
                .insert(key, MethodId::from_index(index))
                .is_some()
            {
                return Err(LayoutError::universe(format!(
                    "type {} declares method {} twice",
                    self.types[method.declaring_type.index()].name,
                    method.name
                )));
            }
        }

        let selector_names = self.selectors.keys().cloned().collect();
        let mut universe = TypeUniverse {
            types: self.types,
            methods: self.methods,
            root: self.root,
            array_interfaces,
            declared_subtypes,
            interface_closure,
            declared_by_selector,
            selector_names,
        };

        let computed: Vec<(usize, Vec<MethodId>)> = self
            .explicit_implementations
            .iter()
            .enumerate()
            .filter(|&(_, &explicit)| !explicit)
            .map(|(index, _)| {
                let method = MethodId::from_index(index);
                (index, compute_implementations(&universe, method))
            })
            .collect();
        for (index, implementations) in computed {
            universe.methods[index].implementations = implementations;
        }

        debug!(
            types = universe.types.len(),
            methods = universe.methods.len(),
            "type universe finished"
        );
        Ok(universe)
    }

    fn check_references(&self) -> LayoutResult<()> {
        let num_types = self.types.len();
        let in_range = |id: TypeId| id.index() < num_types;
        for info in &self.types {
            let dangling = info.superclass.is_some_and(|s| !in_range(s))
                || info.interfaces.iter().any(|&i| !in_range(i))
                || info.component.is_some_and(|c| !in_range(c));
            if dangling {
                return Err(LayoutError::universe(format!(
                    "type {} references a type outside the universe",
                    info.name
                )));
            }
        }
        for method in &self.methods {
            if method
                .implementations
                .iter()
                .any(|m| m.index() >= self.methods.len())
            {
                return Err(LayoutError::universe(format!(
                    "method {} lists an implementation outside the universe",
                    method.name
                )));
            }
        }
        if let Some(bad) = self.array_interfaces.iter().find(|&&i| !in_range(i)) {
            return Err(LayoutError::universe(format!(
                "array interface {bad} is outside the universe"
            )));
        }
        Ok(())
    }

    fn check_kinds(&self) -> LayoutResult<()> {
        for (index, info) in self.types.iter().enumerate() {
            let id = TypeId::from_index(index);
            match info.kind {
                TypeKind::Class => {
                    if id != self.root {
                        let Some(superclass) = info.superclass else {
                            return Err(LayoutError::universe(format!(
                                "class {} has no superclass",
                                info.name
                            )));
                        };
                        if self.types[superclass.index()].kind != TypeKind::Class {
                            return Err(LayoutError::universe(format!(
                                "superclass of {} is not a class",
                                info.name
                            )));
                        }
                    }
                }
                TypeKind::Interface | TypeKind::Primitive => {
                    if info.superclass.is_some() {
                        return Err(LayoutError::universe(format!(
                            "{} cannot have a superclass",
                            info.name
                        )));
                    }
                }
                TypeKind::Array => {}
            }
            if info.kind == TypeKind::Primitive && !info.interfaces.is_empty() {
                return Err(LayoutError::universe(format!(
                    "primitive {} cannot implement interfaces",
                    info.name
                )));
            }
            if let Some(&bad) = info
                .interfaces
                .iter()
                .find(|&&i| self.types[i.index()].kind != TypeKind::Interface)
            {
                return Err(LayoutError::universe(format!(
                    "{} implements {}, which is not an interface",
                    info.name,
                    self.types[bad.index()].name
                )));
            }
            if info.flags.contains(TypeFlags::INSTANTIATED) {
                let concrete_class = info.kind == TypeKind::Class
                    && !info.flags.contains(TypeFlags::ABSTRACT);
                if !concrete_class && info.kind != TypeKind::Array {
                    return Err(LayoutError::universe(format!(
                        "{} is instantiated but is not a concrete class or an array",
                        info.name
                    )));
                }
            }
        }
        for method in &self.methods {
            let kind = self.types[method.declaring_type.index()].kind;
            if !matches!(kind, TypeKind::Class | TypeKind::Interface) {
                return Err(LayoutError::universe(format!(
                    "method {} is declared on {}, which cannot declare methods",
                    method.name,
                    self.types[method.declaring_type.index()].name
                )));
            }
        }
        for &iface in &self.array_interfaces {
            if self.types[iface.index()].kind != TypeKind::Interface {
                return Err(LayoutError::universe(format!(
                    "array interface {} is not an interface",
                    self.types[iface.index()].name
                )));
            }
        }
        Ok(())
    }

    /// Superclasses are fixed at creation, so only interface edges added by
    /// `implements` can close a cycle.
    fn check_acyclic(&self) -> LayoutResult<()> {
        const UNVISITED: u8 = 0;
        const ON_PATH: u8 = 1;
        const DONE: u8 = 2;

        let mut state = vec![UNVISITED; self.types.len()];
        for start in 0..self.types.len() {
            if state[start] != UNVISITED {
                continue;
            }
            let mut stack = vec![(start, false)];
            while let Some((index, expanded)) = stack.pop() {
                if expanded {
                    state[index] = DONE;
                    continue;
                }
                match state[index] {
                    DONE => continue,
                    ON_PATH => {
                        return Err(LayoutError::universe(format!(
                            "cyclic supertype declaration involving {}",
                            self.types[index].name
                        )));
                    }
                    _ => {}
                }
                state[index] = ON_PATH;
                stack.push((index, true));
                for super_type in self.direct_supertypes(index) {
                    match state[super_type.index()] {
                        DONE => {}
                        ON_PATH => {
                            return Err(LayoutError::universe(format!(
                                "cyclic supertype declaration involving {}",
                                self.types[index].name
                            )));
                        }
                        _ => stack.push((super_type.index(), false)),
                    }
                }
            }
        }
        Ok(())
    }

    fn direct_supertypes(&self, index: usize) -> impl Iterator<Item = TypeId> + '_ {
        let info = &self.types[index];
        info.superclass
            .into_iter()
            .chain(info.interfaces.iter().copied())
    }

    fn compute_declared_subtypes(&self) -> Vec<Vec<TypeId>> {
        let mut subtypes = vec![Vec::new(); self.types.len()];
        for (index, info) in self.types.iter().enumerate() {
            let id = TypeId::from_index(index);
            if let Some(superclass) = info.superclass {
                subtypes[superclass.index()].push(id);
            }
            if info.kind == TypeKind::Interface && info.interfaces.is_empty() {
                subtypes[self.root.index()].push(id);
            }
            for &iface in &info.interfaces {
                subtypes[iface.index()].push(id);
            }
        }
        for list in &mut subtypes {
            list.sort_unstable();
            list.dedup();
        }
        subtypes
    }

    /// Post-order walk over supertypes; `check_acyclic` ran first.
    fn compute_interface_closure(&self) -> Vec<Vec<TypeId>> {
        let mut closure: Vec<Option<Vec<TypeId>>> = vec![None; self.types.len()];
        for start in 0..self.types.len() {
            if closure[start].is_some() {
                continue;
            }
            let mut stack = vec![(start, false)];
            while let Some((index, expanded)) = stack.pop() {
                if closure[index].is_some() {
                    continue;
                }
                if !expanded {
                    stack.push((index, true));
                    for super_type in self.direct_supertypes(index) {
                        if closure[super_type.index()].is_none() {
                            stack.push((super_type.index(), false));
                        }
                    }
                    continue;
                }
                let mut set = Vec::new();
                for super_type in self.direct_supertypes(index) {
                    if self.types[super_type.index()].kind == TypeKind::Interface {
                        set.push(super_type);
                    }
                    if let Some(inherited) = &closure[super_type.index()] {
                        set.extend_from_slice(inherited);
                    }
                }
                set.sort_unstable();
                set.dedup();
                closure[index] = Some(set);
            }
        }
        closure.into_iter().map(Option::unwrap_or_default).collect()
    }
}

/// Live targets of `method` over every instantiated subtype of its declaring
/// type.
fn compute_implementations(universe: &TypeUniverse, method: MethodId) -> Vec<MethodId> {
    let declaring = universe.method(method).declaring_type;
    let mut implementations: Vec<MethodId> = universe
        .declared_subtype_closure(declaring)
        .into_iter()
        .filter(|&ty| {
            let info = universe.ty(ty);
            info.is_reachable() && info.is_instantiated()
        })
        .filter_map(|ty| universe.resolve_method(ty, method))
        .collect();
    implementations.sort_unstable();
    implementations.dedup();
    implementations
}

#[cfg(test)]
#[path = "../tests/builder_tests.rs"]
mod tests;
