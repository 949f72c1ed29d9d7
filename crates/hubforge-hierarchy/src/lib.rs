//! Type universe model for hubforge.
//!
//! This crate owns everything the layout passes need to know about the
//! analyzed program:
//!
//! - `universe` / `builder`: the frozen type and method arenas and the
//!   builder that produces them
//! - `resolve`: virtual method resolution
//! - `assignability`: the naive subtype check used for validation
//! - `subtype_graph`: the DAG over reachable types the id assigners walk
//! - `stamps`: strengthened stamp and unique implementation per type

pub mod assignability;
pub mod builder;
pub mod resolve;
pub mod stamps;
pub mod subtype_graph;
pub mod synthetic;
pub mod universe;

pub use assignability::AssignabilityOracle;
pub use builder::UniverseBuilder;
pub use stamps::{TypeStamp, TypeStamps};
pub use subtype_graph::SubtypeGraph;
pub use synthetic::{SyntheticShape, synthetic_universe};
pub use universe::{MethodFlags, MethodInfo, TypeFlags, TypeInfo, TypeKind, TypeUniverse};
