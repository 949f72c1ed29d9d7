//! Dense arena identifiers.
//!
//! Every cross reference in the layout builder is an index into a flat
//! array owned by the `TypeUniverse`. The newtypes below keep those indices
//! apart at the type level.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a type inside one `TypeUniverse`.
///
/// The value is the index of the type in the universe's type array, so it
/// doubles as a key for dense side tables (`Vec<T>` indexed by `TypeId`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl TypeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Identity of a method inside one `TypeUniverse`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MethodId(pub u32);

impl MethodId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Interned method selector (name plus descriptor).
///
/// Two methods override each other iff their selectors are equal and one
/// declaring type is a subtype of the other.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Selector(pub u32);
