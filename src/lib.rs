//! hubforge: build-time type check ids and dispatch tables.
//!
//! Given a closed `TypeUniverse`, `build_layout` produces everything an
//! ahead-of-time compiler writes into the per-type hubs of its image:
//!
//! - range-encoded type check ids (`hubforge_typecheck`), so an
//!   `instanceof` is one load, one subtract and one compare
//! - dispatch tables (`hubforge_dispatch`), compact vtables in the closed
//!   world or class segments plus itables in the open world
//! - strengthened stamps and unique implementations (`hubforge_hierarchy`)
//!
//! `emit` turns a finished layout into serialisable per-type records.

pub mod emit;
pub mod tracing_config;

pub use hubforge_common::{
    LayoutError, LayoutOptions, LayoutResult, MethodId, Selector, TypeId, WorldMode, limits,
};
pub use hubforge_dispatch::{DispatchEntry, DispatchLayout, DispatchTable};
pub use hubforge_hierarchy::{
    MethodFlags, SubtypeGraph, SyntheticShape, TypeFlags, TypeKind, TypeStamp, TypeStamps,
    TypeUniverse, UniverseBuilder, synthetic_universe,
};
pub use hubforge_typecheck::{RangeCheck, TypeCheckData, TypeCheckLayout};

use hubforge_dispatch::{DispatchValidator, build_dispatch};
use hubforge_typecheck::TypeCheckValidator;
use tracing::{debug, info_span};

/// Everything computed for one universe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub type_checks: TypeCheckLayout,
    pub dispatch: DispatchLayout,
    pub stamps: TypeStamps,
}

impl Layout {
    /// Run-time type check: is a value of type `checked` assignable to
    /// `super_type`? `None` for types that are not part of the layout.
    pub fn is_assignable(&self, super_type: TypeId, checked: TypeId) -> Option<bool> {
        self.type_checks.is_assignable(super_type, checked)
    }
}

/// Build the type check ids and dispatch tables of `universe`.
///
/// The validators run when enabled in `options` and turn any divergence from
/// the declared hierarchy into an error instead of a wrong layout.
pub fn build_layout(universe: &TypeUniverse, options: &LayoutOptions) -> LayoutResult<Layout> {
    options.validate()?;
    let _span = info_span!(
        "build_layout",
        types = universe.len(),
        methods = universe.num_methods(),
        world = ?options.world
    )
    .entered();

    let graph = SubtypeGraph::build(universe)?;

    let type_checks = TypeCheckLayout::build(universe, &graph, options.slot_capacity)?;
    if options.verify_type_checks {
        TypeCheckValidator::new(universe, &graph, &type_checks, options.slot_capacity).verify()?;
    }

    let dispatch = build_dispatch(universe, &graph, options.world)?;
    if options.verify_dispatch {
        DispatchValidator::new(universe, &dispatch).verify()?;
    }

    let stamps = TypeStamps::compute(universe, &graph);

    debug!(
        included = graph.num_included(),
        type_check_slots = type_checks.total_slots(),
        dispatch_entries = dispatch.total_entries(),
        "layout built"
    );
    Ok(Layout {
        type_checks,
        dispatch,
        stamps,
    })
}
