//! Build errors.
//!
//! There is no recoverable error path in a layout build: either every table
//! is provably consistent or the build fails. The variants only distinguish
//! *why* it failed so diagnostics can name the types and ids involved.

use thiserror::Error;

pub type LayoutResult<T> = Result<T, LayoutError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The input universe is malformed (dangling ids, wrong kinds, ...).
    #[error("invalid type universe: {message}")]
    Universe { message: String },

    /// An invariant of the layout algorithms does not hold.
    #[error("structural invariant violated: {message}")]
    Structural { message: String },

    /// The range-encoded type check disagrees with the declared hierarchy.
    #[error(
        "type checks do not match: super type {super_type}, checked type {checked_type}, \
         hierarchy check {expected}, range check {actual} (slot {slot}, start {start}, \
         range {range}, id {id})"
    )]
    TypeCheckMismatch {
        super_type: String,
        checked_type: String,
        expected: bool,
        actual: bool,
        slot: u16,
        start: u16,
        range: u16,
        id: u16,
    },

    /// A dispatch table entry disagrees with method resolution.
    #[error(
        "dispatch entry mismatch: type {type_name}, slot {slot}, method {method}, \
         expected {expected}, found {actual}"
    )]
    DispatchMismatch {
        type_name: String,
        slot: u32,
        method: String,
        expected: String,
        actual: String,
    },
}

impl LayoutError {
    pub fn universe(message: impl Into<String>) -> Self {
        Self::Universe {
            message: message.into(),
        }
    }

    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural {
            message: message.into(),
        }
    }
}
