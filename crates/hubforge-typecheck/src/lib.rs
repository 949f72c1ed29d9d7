//! Range-encoded type checks.
//!
//! Every included type gets a vector of 16-bit ids (one per slot) and a
//! `(slot, start, range)` triple such that `X` is a subtype of `T` iff
//! `X.slots[T.slot] - T.start < T.range` as unsigned arithmetic.
//!
//! - `class_ids`: pre-order numbering of the class tree with overflow slots
//! - `interface_ids`: consecutive-ones packing of interface descendant sets
//! - `layout`: both passes combined into a `TypeCheckLayout`
//! - `validator`: all-pairs comparison with the declared hierarchy

pub mod class_ids;
pub mod interface_ids;
pub mod layout;
pub mod range;
pub mod validator;

pub use class_ids::{ClassIdAssignment, ClassIdBuilder, SlotIds};
pub use interface_ids::{InterfaceIdAssignment, InterfaceIdBuilder};
pub use layout::{TypeCheckData, TypeCheckLayout};
pub use range::RangeCheck;
pub use validator::TypeCheckValidator;
