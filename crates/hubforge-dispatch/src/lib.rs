//! Dispatch table construction.
//!
//! Two layouts are supported, selected by `WorldMode`:
//!
//! - `closed_world`: one compact vtable per type. Only methods with more than
//!   one live implementation get a slot, and slot numbers are reused across
//!   unrelated subtrees. Interface calls go through the same vtable.
//! - `open_world`: an append-only class segment inherited down the class tree,
//!   followed by one itable segment per implemented interface.
//!
//! `validator` re-resolves every reachable entry and compares.

pub mod closed_world;
pub mod open_world;
pub mod table;
pub mod validator;

pub use closed_world::ClosedWorldBuilder;
pub use open_world::OpenWorldBuilder;
pub use table::{DispatchEntry, DispatchLayout, DispatchTable};
pub use validator::DispatchValidator;

use hubforge_common::{LayoutResult, WorldMode};
use hubforge_hierarchy::{SubtypeGraph, TypeUniverse};

/// Build the dispatch tables of `universe` for the given world.
pub fn build_dispatch(
    universe: &TypeUniverse,
    graph: &SubtypeGraph,
    world: WorldMode,
) -> LayoutResult<DispatchLayout> {
    match world {
        WorldMode::Closed => ClosedWorldBuilder::new(universe, graph).build(),
        WorldMode::Open => OpenWorldBuilder::new(universe).build(),
    }
}
